//! TwiML document generation for the webhook integration path
//!
//! Pure template-fill over business configuration. Spoken text is
//! XML-escaped so caller-provided content can never break the
//! document.

/// Seconds the gather waits for speech or keypad input
const GATHER_TIMEOUT_SECS: u32 = 5;
/// Webhook that processes gathered input
const PROCESS_ACTION: &str = "/voice/process";
/// Webhook that receives recorded voicemail
const VOICEMAIL_ACTION: &str = "/voice/voicemail";
/// Maximum voicemail length in seconds
const RECORD_MAX_SECS: u32 = 120;

/// Stateless builder for telephony webhook responses
#[derive(Debug, Clone)]
pub struct WebhookResponder {
    voice: String,
    business_name: String,
    forward_number: String,
}

impl WebhookResponder {
    pub fn new(
        voice: impl Into<String>,
        business_name: impl Into<String>,
        forward_number: impl Into<String>,
    ) -> Self {
        Self {
            voice: voice.into(),
            business_name: business_name.into(),
            forward_number: forward_number.into(),
        }
    }

    /// Greeting with a gather, falling back to a transfer when no
    /// input arrives within the timeout
    pub fn greeting(&self) -> String {
        format!(
            "{}<Response>\
             <Say voice=\"{voice}\">Hello, thank you for calling {name}. \
             I'm your AI assistant. How can I help you today?</Say>\
             <Gather input=\"speech dtmf\" timeout=\"{timeout}\" action=\"{action}\" method=\"POST\">\
             <Say voice=\"{voice}\">Press 1 to schedule an appointment, press 2 for a quote, \
             or press 0 to speak with someone. Or just tell me what you need.</Say>\
             </Gather>\
             <Say voice=\"{voice}\">I didn't catch that. Let me transfer you to a team member.</Say>\
             <Dial>{forward}</Dial>\
             </Response>",
            XML_DECLARATION,
            voice = xml_escape(&self.voice),
            name = xml_escape(&self.business_name),
            timeout = GATHER_TIMEOUT_SECS,
            action = PROCESS_ACTION,
            forward = xml_escape(&self.forward_number),
        )
    }

    /// Speak `text`, then gather the next input
    pub fn response(&self, text: &str) -> String {
        format!(
            "{}<Response>\
             <Say voice=\"{voice}\">{text}</Say>\
             <Gather input=\"speech dtmf\" timeout=\"{timeout}\" action=\"{action}\" method=\"POST\">\
             <Say voice=\"{voice}\">Is there anything else I can help with?</Say>\
             </Gather>\
             </Response>",
            XML_DECLARATION,
            voice = xml_escape(&self.voice),
            text = xml_escape(text),
            timeout = GATHER_TIMEOUT_SECS,
            action = PROCESS_ACTION,
        )
    }

    /// Brief hold message, then bridge the call to `number`
    pub fn transfer(&self, number: &str) -> String {
        format!(
            "{}<Response>\
             <Say voice=\"{voice}\">Please hold while I connect you.</Say>\
             <Dial>{number}</Dial>\
             </Response>",
            XML_DECLARATION,
            voice = xml_escape(&self.voice),
            number = xml_escape(number),
        )
    }

    /// Voicemail prompt followed by a transcribed recording
    pub fn voicemail(&self) -> String {
        format!(
            "{}<Response>\
             <Say voice=\"{voice}\">Sorry we missed you. Please leave your name, number, \
             and a brief message, and we'll get back to you shortly.</Say>\
             <Record maxLength=\"{max}\" action=\"{action}\" transcribe=\"true\"/>\
             </Response>",
            XML_DECLARATION,
            voice = xml_escape(&self.voice),
            max = RECORD_MAX_SECS,
            action = VOICEMAIL_ACTION,
        )
    }
}

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// Escape text for placement inside an XML element or attribute
pub(crate) fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responder() -> WebhookResponder {
        WebhookResponder::new("Polly.Joanna", "Stone Works", "+16025550100")
    }

    #[test]
    fn test_greeting_document() {
        let doc = responder().greeting();

        assert!(doc.starts_with(XML_DECLARATION));
        assert!(doc.contains("Stone Works"));
        assert!(doc.contains("<Gather input=\"speech dtmf\" timeout=\"5\" action=\"/voice/process\" method=\"POST\">"));
        assert!(doc.contains("<Dial>+16025550100</Dial>"));
        assert!(doc.ends_with("</Response>"));
    }

    #[test]
    fn test_response_document_gathers_again() {
        let doc = responder().response("We are open weekdays.");

        assert!(doc.contains("<Say voice=\"Polly.Joanna\">We are open weekdays.</Say>"));
        assert!(doc.contains("<Gather"));
        assert!(doc.contains("action=\"/voice/process\""));
    }

    #[test]
    fn test_transfer_document() {
        let doc = responder().transfer("+15550001111");

        assert!(doc.contains("Please hold"));
        assert!(doc.contains("<Dial>+15550001111</Dial>"));
        assert!(!doc.contains("<Gather"));
    }

    #[test]
    fn test_voicemail_document() {
        let doc = responder().voicemail();

        assert!(doc.contains("<Record maxLength=\"120\" action=\"/voice/voicemail\" transcribe=\"true\"/>"));
    }

    #[test]
    fn test_spoken_text_is_escaped() {
        let doc = responder().response("granite & <marble> \"deals\"");

        assert!(doc.contains("granite &amp; &lt;marble&gt; &quot;deals&quot;"));
        assert!(!doc.contains("<marble>"));
    }

    #[test]
    fn test_escape_handles_all_specials() {
        assert_eq!(xml_escape("a&b<c>d\"e'f"), "a&amp;b&lt;c&gt;d&quot;e&apos;f");
        assert_eq!(xml_escape("plain"), "plain");
    }
}
