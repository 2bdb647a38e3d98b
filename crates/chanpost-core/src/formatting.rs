/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_telegram_html_specials() {
        assert_eq!(
            escape_html(r#"<b d="1">&x</b>"#),
            "&lt;b d=&quot;1&quot;&gt;&amp;x&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }
}
