use super::*;

#[test]
fn parses_vote_with_user_and_locale() {
    let cli = Cli::try_parse_from(["pollview", "--user", "bob", "--locale", "en", "vote", "7", "Sushi"]).unwrap();
    assert_eq!(cli.user.as_deref(), Some("bob"));
    assert_eq!(cli.locale.as_deref(), Some("en"));
    assert!(matches!(cli.command, Command::Vote { ref poll_id, ref option } if poll_id == "7" && option == "Sushi"));
}

#[test]
fn parses_watch_with_default_interval() {
    let cli = Cli::try_parse_from(["pollview", "watch", "7"]).unwrap();
    assert!(matches!(cli.command, Command::Watch { interval_secs: 5, .. }));
    assert!(!cli.json);
}

#[test]
fn vote_requires_option() {
    assert!(Cli::try_parse_from(["pollview", "vote", "7"]).is_err());
}

#[test]
fn cli_error_messages_are_readable() {
    assert_eq!(CliError::UnknownOption("Ramen".into()).to_string(), "option \"Ramen\" is not part of this poll");
    assert_eq!(CliError::Poll("Voting failed".into()).to_string(), "Voting failed");
}
