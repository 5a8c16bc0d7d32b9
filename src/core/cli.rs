use std::path::PathBuf;

pub const USAGE: &str = "\
Usage:
  nightqueue server  [--port N] [--queue-name PREFIX] [--config FILE] [--logs DIR]
  nightqueue execute [QUEUE_FILE] [--config FILE] [--logs DIR]
  nightqueue list    [QUEUE_FILE] [--config FILE] [--logs DIR]
  nightqueue config  [--config FILE] [--logs DIR]

QUEUE_FILE defaults to the night just handed off (execute) or the queue still
admitting requests (list), both dated by the site's local calendar.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Server {
        port: Option<u16>,
        queue_name: Option<String>,
    },
    Execute {
        queue_file: Option<PathBuf>,
    },
    List {
        queue_file: Option<PathBuf>,
    },
    Config,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub command: CliCommand,
    pub config_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl CliArgs {
    pub fn from_env() -> Result<Self, String> {
        Self::from_args(std::env::args().skip(1))
    }

    pub fn from_args<I>(mut args: I) -> Result<Self, String>
    where
        I: Iterator<Item = String>,
    {
        let mut command = match args.next().as_deref() {
            Some("server") => CliCommand::Server {
                port: None,
                queue_name: None,
            },
            Some("execute") => CliCommand::Execute { queue_file: None },
            Some("list") => CliCommand::List { queue_file: None },
            Some("config") => CliCommand::Config,
            Some("help" | "--help" | "-h") => CliCommand::Help,
            Some(other) => return Err(format!("Unknown command: {other}")),
            None => return Err("Missing command.".to_string()),
        };
        let mut parsed = Self::defaults(CliCommand::Help);
        let mut help = false;

        while let Some(arg) = args.next() {
            let unknown = || format!("Unknown argument: {arg}");
            match arg.as_str() {
                "--config" => parsed.config_path = Self::next_path(&mut args, "--config")?,
                "--logs" => parsed.logs_dir = Self::next_path(&mut args, "--logs")?,
                "--help" | "-h" => help = true,
                "--port" => match &mut command {
                    CliCommand::Server { port, .. } => {
                        let raw = Self::next_value(&mut args, "--port")?;
                        *port = Some(
                            raw.parse::<u16>()
                                .map_err(|_| format!("Invalid port: {raw}"))?,
                        );
                    }
                    _ => return Err(unknown()),
                },
                "--queue-name" => match &mut command {
                    CliCommand::Server { queue_name, .. } => {
                        *queue_name = Some(Self::next_value(&mut args, "--queue-name")?);
                    }
                    _ => return Err(unknown()),
                },
                positional if !positional.starts_with('-') => match &mut command {
                    CliCommand::Execute { queue_file } | CliCommand::List { queue_file }
                        if queue_file.is_none() =>
                    {
                        *queue_file = Some(PathBuf::from(positional));
                    }
                    _ => return Err(unknown()),
                },
                _ => return Err(unknown()),
            }
        }

        if help {
            command = CliCommand::Help;
        }
        parsed.command = command;
        Ok(parsed)
    }

    fn next_value<I>(args: &mut I, flag: &str) -> Result<String, String>
    where
        I: Iterator<Item = String>,
    {
        args.next().ok_or_else(|| format!("Missing value for {flag}"))
    }

    fn next_path<I>(args: &mut I, flag: &str) -> Result<PathBuf, String>
    where
        I: Iterator<Item = String>,
    {
        Self::next_value(args, flag).map(PathBuf::from)
    }

    fn defaults(command: CliCommand) -> Self {
        Self {
            command,
            config_path: PathBuf::from("config.json"),
            logs_dir: PathBuf::from("logs"),
        }
    }
}
