use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub mod database;
pub mod logging;

pub const ARG_LISTEN: &str = "listen";
pub const ARG_PORT: &str = "port";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("adverts")
        .about("Advertisement board API")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_LISTEN)
                .long("listen")
                .help("Address to listen on")
                .default_value("127.0.0.1")
                .env("ADVERTS_LISTEN"),
        )
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("5000")
                .env("ADVERTS_PORT")
                .value_parser(clap::value_parser!(u16)),
        );

    logging::with_args(database::with_args(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "adverts");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Advertisement board API".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_check_port_and_listen() {
        temp_env::with_vars([("ADVERTS_PORT", None::<&str>), ("ADVERTS_LISTEN", None)], || {
            let matches = new().get_matches_from(vec!["adverts", "--port", "8080"]);
            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(8080));
            assert_eq!(
                matches.get_one::<String>(ARG_LISTEN).map(String::as_str),
                Some("127.0.0.1")
            );
        });
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("ADVERTS_PORT", Some("443")),
                ("ADVERTS_LISTEN", Some("::")),
                ("ADVERTS_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["adverts"]);
                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(443));
                assert_eq!(
                    matches.get_one::<String>(ARG_LISTEN).map(String::as_str),
                    Some("::")
                );
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("ADVERTS_LOG_LEVEL", Some(level))], || {
                let matches = new().get_matches_from(vec!["adverts"]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        for count in 1..=4_u8 {
            temp_env::with_vars([("ADVERTS_LOG_LEVEL", None::<String>)], || {
                let flag = format!("-{}", "v".repeat(usize::from(count)));
                let matches = new().get_matches_from(vec!["adverts".to_string(), flag]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(count)
                );
            });
        }
    }
}
