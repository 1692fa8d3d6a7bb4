/// Parsed request line.
///
/// Grammar: `VERB [arg {, arg}]`. The verb is case-insensitive; arguments are
/// comma-separated and trimmed so facility names may contain spaces.
#[derive(Debug, PartialEq)]
pub enum Command {
    Book {
        facility: String,
        date: String,
        start: String,
        end: String,
    },
    Quote {
        facility: String,
        start: String,
        end: String,
    },
    Bookings {
        facility: String,
        date: String,
    },
    Facilities,
    Quit,
}

#[derive(Debug, PartialEq)]
pub enum ParseError {
    Empty,
    UnknownCommand(String),
    Arity {
        command: &'static str,
        expected: usize,
        got: usize,
    },
    EmptyArgument(&'static str),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty request"),
            ParseError::UnknownCommand(verb) => write!(f, "unknown command: {verb}"),
            ParseError::Arity {
                command,
                expected,
                got,
            } => write!(f, "{command} takes {expected} arguments, got {got}"),
            ParseError::EmptyArgument(command) => write!(f, "{command}: empty argument"),
        }
    }
}

impl std::error::Error for ParseError {}

pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (trimmed, ""),
    };

    match verb.to_ascii_uppercase().as_str() {
        "BOOK" => {
            let [facility, date, start, end] = args::<4>("BOOK", rest)?;
            Ok(Command::Book {
                facility,
                date,
                start,
                end,
            })
        }
        "QUOTE" => {
            let [facility, start, end] = args::<3>("QUOTE", rest)?;
            Ok(Command::Quote {
                facility,
                start,
                end,
            })
        }
        "BOOKINGS" => {
            let [facility, date] = args::<2>("BOOKINGS", rest)?;
            Ok(Command::Bookings { facility, date })
        }
        "FACILITIES" => {
            args::<0>("FACILITIES", rest)?;
            Ok(Command::Facilities)
        }
        "QUIT" => {
            args::<0>("QUIT", rest)?;
            Ok(Command::Quit)
        }
        _ => Err(ParseError::UnknownCommand(verb.to_string())),
    }
}

/// Split `rest` into exactly `N` non-empty, trimmed, comma-separated arguments.
fn args<const N: usize>(command: &'static str, rest: &str) -> Result<[String; N], ParseError> {
    let parts: Vec<String> = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(|p| p.trim().to_string()).collect()
    };
    if parts.iter().any(String::is_empty) {
        return Err(ParseError::EmptyArgument(command));
    }
    let got = parts.len();
    parts.try_into().map_err(|_| ParseError::Arity {
        command,
        expected: N,
        got,
    })
}

/// Metric label for a command.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::Book { .. } => "book",
        Command::Quote { .. } => "quote",
        Command::Bookings { .. } => "bookings",
        Command::Facilities => "facilities",
        Command::Quit => "quit",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_book_with_spaces_in_name() {
        let cmd = parse_command("BOOK Tennis Court, 2020-10-26, 16:00, 20:00").unwrap();
        assert_eq!(
            cmd,
            Command::Book {
                facility: "Tennis Court".into(),
                date: "2020-10-26".into(),
                start: "16:00".into(),
                end: "20:00".into(),
            }
        );
    }

    #[test]
    fn verb_is_case_insensitive() {
        assert_eq!(parse_command("facilities").unwrap(), Command::Facilities);
        assert_eq!(parse_command("  Quit  ").unwrap(), Command::Quit);
        assert!(matches!(
            parse_command("book Clubhouse,2020-10-26,16:00,22:00"),
            Ok(Command::Book { .. })
        ));
    }

    #[test]
    fn parse_quote_and_bookings() {
        assert_eq!(
            parse_command("QUOTE Clubhouse, 14:00, 18:00").unwrap(),
            Command::Quote {
                facility: "Clubhouse".into(),
                start: "14:00".into(),
                end: "18:00".into(),
            }
        );
        assert_eq!(
            parse_command("BOOKINGS Clubhouse, 2020-10-26").unwrap(),
            Command::Bookings {
                facility: "Clubhouse".into(),
                date: "2020-10-26".into(),
            }
        );
    }

    #[test]
    fn wrong_arity() {
        assert_eq!(
            parse_command("BOOK Clubhouse, 2020-10-26, 16:00"),
            Err(ParseError::Arity {
                command: "BOOK",
                expected: 4,
                got: 3
            })
        );
        assert_eq!(
            parse_command("FACILITIES all"),
            Err(ParseError::Arity {
                command: "FACILITIES",
                expected: 0,
                got: 1
            })
        );
        assert_eq!(
            parse_command("BOOK"),
            Err(ParseError::Arity {
                command: "BOOK",
                expected: 4,
                got: 0
            })
        );
    }

    #[test]
    fn empty_argument_rejected() {
        assert_eq!(
            parse_command("BOOK Clubhouse, , 16:00, 22:00"),
            Err(ParseError::EmptyArgument("BOOK"))
        );
    }

    #[test]
    fn empty_and_unknown() {
        assert_eq!(parse_command("   "), Err(ParseError::Empty));
        assert_eq!(
            parse_command("CANCEL x"),
            Err(ParseError::UnknownCommand("CANCEL".into()))
        );
    }
}
