use refresh_core::{ChannelId, ConfigField, FieldId, FieldParseError, JobKind};

/// One line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Kind(JobKind),
    Set(ConfigField),
    SelectAll,
    SelectNone,
    Toggle(Vec<ChannelId>),
    Channels,
    Show,
    Submit,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("'{0}' is not a channel id")]
    BadChannelId(String),
    #[error(transparent)]
    Field(#[from] FieldParseError),
}

pub const HELP: &str = "\
Commands:
  kind posts|comments        switch job kind (resets fields to its defaults)
  set <field> <value>        edit a field; an empty value clears it
  select all|none            select every active channel / clear the selection
  toggle <id> [<id>..]       flip channel ids in the selection
  channels                   list active channels
  show                       print the current form
  submit                     launch the job
  help                       this text
  quit                       leave (a running job keeps running on the backend)

Fields: post_mode, days, since, post_limit, update_existing,
        comment_mode, comment_limit, analyze";

/// Parses one prompt line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match head.to_ascii_lowercase().as_str() {
        "kind" => match rest.as_slice() {
            [kind] => ConsoleCommand::Kind(kind.parse()?),
            _ => return Err(CommandError::Usage("kind posts|comments")),
        },
        "set" => match rest.split_first() {
            Some((field, value)) => {
                let field: FieldId = field.parse()?;
                if field == FieldId::ChannelIds {
                    return Err(CommandError::Usage("select all|none or toggle <id>.."));
                }
                ConsoleCommand::Set(ConfigField::parse(field, &value.join(" "))?)
            }
            None => return Err(CommandError::Usage("set <field> <value>")),
        },
        "select" => match rest.as_slice() {
            ["all"] => ConsoleCommand::SelectAll,
            ["none"] => ConsoleCommand::SelectNone,
            _ => return Err(CommandError::Usage("select all|none")),
        },
        "toggle" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("toggle <id> [<id>..]"));
            }
            let ids = rest
                .iter()
                .flat_map(|word| word.split(','))
                .filter(|part| !part.is_empty())
                .map(|part| {
                    part.parse::<ChannelId>()
                        .map_err(|_| CommandError::BadChannelId(part.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            ConsoleCommand::Toggle(ids)
        }
        "channels" => ConsoleCommand::Channels,
        "show" => ConsoleCommand::Show,
        "submit" => ConsoleCommand::Submit,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use refresh_core::PostRefreshMode;

    use super::*;

    #[test]
    fn parses_field_edits() {
        assert_eq!(
            parse_command("set days 14"),
            Ok(Some(ConsoleCommand::Set(ConfigField::PostRefreshDays(Some(14)))))
        );
        assert_eq!(
            parse_command("set post_mode since_date"),
            Ok(Some(ConsoleCommand::Set(ConfigField::PostRefreshMode(
                PostRefreshMode::SinceDate
            ))))
        );
        assert_eq!(
            parse_command("set since 2024-06-01"),
            Ok(Some(ConsoleCommand::Set(ConfigField::PostRefreshStartDate(
                NaiveDate::from_ymd_opt(2024, 6, 1)
            ))))
        );
    }

    #[test]
    fn set_without_value_clears_the_field() {
        assert_eq!(
            parse_command("set post_limit"),
            Ok(Some(ConsoleCommand::Set(ConfigField::PostLimitPerChannel(None))))
        );
    }

    #[test]
    fn toggle_accepts_spaces_and_commas() {
        assert_eq!(
            parse_command("toggle 3 5,8"),
            Ok(Some(ConsoleCommand::Toggle(vec![3, 5, 8])))
        );
        assert_eq!(
            parse_command("toggle 3 x"),
            Err(CommandError::BadChannelId("x".to_string()))
        );
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(
            parse_command("launch"),
            Err(CommandError::Unknown("launch".to_string()))
        );
        assert!(matches!(
            parse_command("set days soon"),
            Err(CommandError::Field(FieldParseError::InvalidNumber { .. }))
        ));
        assert!(matches!(
            parse_command("set channel_ids 1"),
            Err(CommandError::Usage(_))
        ));
    }

    #[test]
    fn kind_and_simple_commands() {
        assert_eq!(
            parse_command("kind comments"),
            Ok(Some(ConsoleCommand::Kind(JobKind::CollectComments)))
        );
        assert_eq!(parse_command("SUBMIT"), Ok(Some(ConsoleCommand::Submit)));
        assert_eq!(parse_command("select none"), Ok(Some(ConsoleCommand::SelectNone)));
    }
}
