/// Automatic responder used when the addressed officer is offline.
pub trait BotResponder: Send + Sync {
    fn reply(&self, body: &str) -> Option<String>;
}

struct KeywordRule {
    keywords: &'static [&'static str],
    reply: &'static str,
}

const RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["certificate", "character", "cert"],
        reply: "You can request a character certificate from the Certificates page. \
                Approved certificates can be downloaded there. If a request was rejected \
                you may reapply after 7 days.",
    },
    KeywordRule {
        keywords: &["samurdhi", "welfare", "loan", "microfinance", "subsidy"],
        reply: "Samurdhi and microfinance applications are submitted from the Welfare page. \
                The officer reviews open applications in the order they were received.",
    },
    KeywordRule {
        keywords: &["clinic", "pregnan", "baby", "vaccin", "midwife", "child"],
        reply: "Clinic dates are shown on your health record. Please contact the public \
                health midwife for urgent maternal or child care questions.",
    },
    KeywordRule {
        keywords: &["office", "hours", "open", "visit"],
        reply: "The Grama Niladhari office is open on Tuesdays and Fridays from 8.30 a.m. \
                to 4.15 p.m.",
    },
];

/// Keyword matcher covering the questions residents ask most.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordBot;

impl BotResponder for KeywordBot {
    fn reply(&self, body: &str) -> Option<String> {
        let lowered = body.to_lowercase();
        RULES
            .iter()
            .find(|rule| rule.keywords.iter().any(|keyword| lowered.contains(keyword)))
            .map(|rule| rule.reply.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_keywords_case_insensitively() {
        let bot = KeywordBot;
        let reply = bot.reply("How do I get my CERTIFICATE?").expect("reply");
        assert!(reply.contains("Certificates page"));

        let reply = bot.reply("When is the next clinic for my baby").expect("reply");
        assert!(reply.contains("midwife"));
    }

    #[test]
    fn unknown_topics_get_no_reply() {
        assert_eq!(KeywordBot.reply("Good morning sir"), None);
    }
}
