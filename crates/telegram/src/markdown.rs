//! Escaping for Telegram's legacy Markdown parse mode

const MARKDOWN_SPECIAL: [char; 4] = ['_', '*', '`', '['];

/// Backslash-escape every character legacy Markdown treats as markup
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Longest text the Bot API accepts in one message, in characters
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Split `text` into chunks of at most [`MAX_MESSAGE_LENGTH`] characters.
///
/// Chunks end at the last newline that fits when there is one, and never
/// between an escaping backslash and the character it escapes.
pub fn split_message(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest: Vec<char> = text.chars().collect();

    while rest.len() > MAX_MESSAGE_LENGTH {
        let window = &rest[..MAX_MESSAGE_LENGTH];
        let mut cut = match window.iter().rposition(|&c| c == '\n') {
            Some(newline) if newline > 0 => newline + 1,
            _ => MAX_MESSAGE_LENGTH,
        };

        // Odd run of trailing backslashes means the last one escapes the
        // first character of the next chunk
        let trailing = window[..cut].iter().rev().take_while(|&&c| c == '\\').count();
        if trailing % 2 == 1 {
            cut -= 1;
        }

        chunks.push(rest[..cut].iter().collect());
        rest.drain(..cut);
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.into_iter().collect());
    }
    chunks
}
