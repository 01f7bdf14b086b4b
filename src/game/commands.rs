//! Command parsing: raw input lines into typed verbs.
//!
//! Verbs are case-insensitive and carry their aliases from the classic
//! command surface (`exit` for quit, `probe` for inspect, and so on).
//! Arguments that name items are lowercased to match catalog ids; chat text
//! and passwords keep their original case.

/// A parsed player command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { name: String, password: String },
    Quit,
    Help,
    Look,
    Who,
    Stats,
    Inventory,
    ShopList,
    Buy { item: String },
    Cast { spell: String },
    Go { portal: String },
    Attack { query: Option<String> },
    Retreat,
    Say { text: String },
    Shout { text: String },
    Use { item: String },
    Where { name: String },
    Top,
    Wield { item: String },
    Unwield,
    Inspect { target: String },
    Take { item: String },
    Drop { item: String },
    Give { item: String, target: String },
    Junk { item: String },
    /// Recognized verb, wrong arity; carries the usage line.
    Usage(&'static str),
    Unknown(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let raw = line.trim();
        if raw.is_empty() {
            return Command::Empty;
        }
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let verb = tokens[0].to_ascii_lowercase();
        let rest_lower = || tokens[1..].join(" ").to_ascii_lowercase();
        // Text after the verb with internal spacing and case preserved.
        let rest_raw = || {
            raw.splitn(2, char::is_whitespace)
                .nth(1)
                .map(|s| s.trim_start().to_string())
        };

        match verb.as_str() {
            "login" => {
                if tokens.len() < 3 {
                    Command::Usage("Usage: login <name> <password>")
                } else {
                    Command::Login {
                        name: tokens[1].to_string(),
                        password: tokens[2].to_string(),
                    }
                }
            }
            "quit" | "exit" => Command::Quit,
            "help" => Command::Help,
            "look" => Command::Look,
            "who" => Command::Who,
            "stats" | "whoami" => Command::Stats,
            "inv" => Command::Inventory,
            "list" => Command::ShopList,
            "buy" => match tokens.len() {
                1 => Command::Usage("Usage: buy <item>"),
                _ => Command::Buy { item: rest_lower() },
            },
            "cast" => match tokens.len() {
                1 => Command::Usage("Usage: cast <spell>"),
                _ => Command::Cast {
                    spell: tokens[1].to_ascii_lowercase(),
                },
            },
            "go" | "enter" => match tokens.len() {
                1 => Command::Usage("Usage: go <portal>"),
                _ => Command::Go {
                    portal: tokens[1].to_string(),
                },
            },
            "attack" => Command::Attack {
                query: if tokens.len() > 1 {
                    Some(rest_lower())
                } else {
                    None
                },
            },
            "retreat" => Command::Retreat,
            "say" => match rest_raw() {
                Some(text) if !text.is_empty() => Command::Say { text },
                _ => Command::Usage("Say what?"),
            },
            "shout" => match rest_raw() {
                Some(text) if !text.is_empty() => Command::Shout { text },
                _ => Command::Usage("Your voice echoes, but you said nothing."),
            },
            "use" => match tokens.len() {
                1 => Command::Usage("Usage: use <item>"),
                _ => Command::Use { item: rest_lower() },
            },
            "where" => match tokens.len() {
                1 => Command::Usage("Usage: where <name>"),
                _ => Command::Where {
                    name: tokens[1].to_string(),
                },
            },
            "top" | "leaderboard" => Command::Top,
            "wield" | "equip" => match tokens.len() {
                1 => Command::Usage("Wield what?"),
                _ => Command::Wield { item: rest_lower() },
            },
            "unwield" => Command::Unwield,
            "inspect" | "probe" | "examine" => match tokens.len() {
                1 => Command::Usage("What do you want to inspect?"),
                _ => Command::Inspect {
                    target: rest_lower(),
                },
            },
            "get" | "take" | "pickup" => match tokens.len() {
                1 => Command::Usage("Take what?"),
                _ => Command::Take { item: rest_lower() },
            },
            "drop" => match tokens.len() {
                1 => Command::Usage("Drop what?"),
                _ => Command::Drop { item: rest_lower() },
            },
            "give" => {
                if tokens.len() < 3 {
                    Command::Usage("Usage: give <item> <player>")
                } else {
                    Command::Give {
                        item: tokens[1..tokens.len() - 1].join(" ").to_ascii_lowercase(),
                        target: tokens[tokens.len() - 1].to_string(),
                    }
                }
            }
            "junk" => match tokens.len() {
                1 => Command::Usage("Usage: junk <item>"),
                _ => Command::Junk { item: rest_lower() },
            },
            _ => Command::Unknown(tokens[0].to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_are_case_insensitive() {
        assert_eq!(Command::parse("LOOK"), Command::Look);
        assert_eq!(Command::parse("Quit"), Command::Quit);
        assert_eq!(Command::parse("exit"), Command::Quit);
        assert_eq!(Command::parse("WhoAmI"), Command::Stats);
        assert_eq!(Command::parse("leaderboard"), Command::Top);
    }

    #[test]
    fn login_requires_both_arguments() {
        assert_eq!(
            Command::parse("login Mor s3cret"),
            Command::Login {
                name: "Mor".into(),
                password: "s3cret".into()
            }
        );
        assert!(matches!(Command::parse("login Mor"), Command::Usage(_)));
    }

    #[test]
    fn say_preserves_case_and_spacing() {
        assert_eq!(
            Command::parse("say Hello THERE friend"),
            Command::Say {
                text: "Hello THERE friend".into()
            }
        );
        assert!(matches!(Command::parse("say"), Command::Usage(_)));
    }

    #[test]
    fn item_arguments_are_lowercased() {
        assert_eq!(
            Command::parse("buy Potion"),
            Command::Buy {
                item: "potion".into()
            }
        );
        assert_eq!(
            Command::parse("take Rusty Sword"),
            Command::Take {
                item: "rusty sword".into()
            }
        );
    }

    #[test]
    fn give_splits_item_from_trailing_player() {
        assert_eq!(
            Command::parse("give iron key Phil"),
            Command::Give {
                item: "iron key".into(),
                target: "Phil".into()
            }
        );
        assert!(matches!(Command::parse("give potion"), Command::Usage(_)));
    }

    #[test]
    fn attack_query_is_optional() {
        assert_eq!(Command::parse("attack"), Command::Attack { query: None });
        assert_eq!(
            Command::parse("attack ink sprite"),
            Command::Attack {
                query: Some("ink sprite".into())
            }
        );
    }

    #[test]
    fn unknown_and_empty_lines() {
        assert_eq!(Command::parse("   "), Command::Empty);
        assert_eq!(Command::parse("dance"), Command::Unknown("dance".into()));
    }
}
