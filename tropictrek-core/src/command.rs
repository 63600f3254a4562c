//! Slash commands shared by the front ends.

use crate::error::CommandError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    ListPdfs,
    /// 1-based PDF number; `None` means the most recent
    Download(Option<usize>),
    Preview(Option<usize>),
}

impl Command {
    pub fn is_command(input: &str) -> bool {
        input.trim_start().starts_with('/')
    }

    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let body = input.trim().trim_start_matches('/');
        let parts: Vec<&str> = body.split_whitespace().collect();
        let Some(name) = parts.first() else {
            return Err(CommandError::Empty);
        };

        match *name {
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            "pdfs" => Ok(Command::ListPdfs),
            "download" => parse_index(name, parts.get(1)).map(Command::Download),
            "preview" => parse_index(name, parts.get(1)).map(Command::Preview),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_index(command: &str, arg: Option<&&str>) -> Result<Option<usize>, CommandError> {
    let Some(arg) = arg else {
        return Ok(None);
    };
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(CommandError::InvalidIndex {
            command: command.to_string(),
            arg: arg.to_string(),
        }),
    }
}

pub const HELP_TEXT: &str = "Available commands:
  /help              - Show this help
  /pdfs              - List itineraries generated in this conversation
  /download [n]      - Save itinerary n (default: latest) to the download folder
  /preview [n]       - Preview and edit itinerary n (default: latest)
  /quit              - Exit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/help"), Ok(Command::Help));
        assert_eq!(Command::parse("/exit"), Ok(Command::Quit));
        assert_eq!(Command::parse(" /pdfs "), Ok(Command::ListPdfs));
        assert_eq!(Command::parse("/download"), Ok(Command::Download(None)));
        assert_eq!(Command::parse("/download 2"), Ok(Command::Download(Some(2))));
        assert_eq!(Command::parse("/preview 1"), Ok(Command::Preview(Some(1))));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse("/"), Err(CommandError::Empty));
        assert_eq!(
            Command::parse("/fly"),
            Err(CommandError::Unknown("fly".to_string()))
        );
        assert!(matches!(
            Command::parse("/download 0"),
            Err(CommandError::InvalidIndex { .. })
        ));
        assert!(matches!(
            Command::parse("/preview latest"),
            Err(CommandError::InvalidIndex { .. })
        ));
    }
}
