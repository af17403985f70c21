/// A parsed text command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetRts(bool),
    SetDtr(bool),
    Unrecognized,
}

/// Parse a text command.
/// Format: SET RTS <n> | SET DTR <n>
///
/// Keywords match case-insensitively and each is followed by exactly one
/// space. The argument is read like C `atoi`: leading whitespace and a sign are
/// skipped, digits are read up to the first non-digit, and no digits means 0.
/// Anything after the argument is ignored.
pub fn parse_command(text: &str) -> Command {
    let Some(rest) = strip_keyword(text, "SET ") else {
        return Command::Unrecognized;
    };

    if let Some(arg) = strip_keyword(rest, "RTS ") {
        Command::SetRts(parse_level(arg))
    } else if let Some(arg) = strip_keyword(rest, "DTR ") {
        Command::SetDtr(parse_level(arg))
    } else {
        Command::Unrecognized
    }
}

fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let head = text.get(..keyword.len())?;
    if head.eq_ignore_ascii_case(keyword) {
        Some(&text[keyword.len()..])
    } else {
        None
    }
}

/// Non-zero argument asserts the line.
fn parse_level(arg: &str) -> bool {
    let arg = arg.trim_start();
    let digits = arg.strip_prefix(['+', '-']).unwrap_or(arg);
    digits
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .any(|c| c != '0')
}
