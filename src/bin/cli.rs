//! kisslight CLI Client
//!
//! Command-line interface for controlling devices through a kiss-light hub.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use kisslight::learn::{classify, CodeRole, DeviceAddRequest, LearnedCode};
use kisslight::protocol::{Command, DeviceType, Generation, ProtocolVersion, UpdateField};
use kisslight::{Config, HubClient, KlError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// kisslight CLI
#[derive(Parser, Debug)]
#[command(name = "kisslight-cli")]
#[command(about = "Control lights, outlets and strips through a kiss-light hub")]
#[command(version)]
struct Args {
    /// Config file (default: $KISSLIGHT_CONFIG or ~/.config/kisslight/client.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Hub address (ip:port), overrides the config file for this run
    #[arg(long)]
    hub: Option<SocketAddr>,

    /// Log protocol traffic to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Toggle a device on or off
    Toggle {
        /// Device name
        name: String,
    },

    /// Send a command to a device, e.g. `set lamp power on`
    Set {
        /// Device name
        name: String,

        /// Device command (POWER, DIMMER, COLOR, ...)
        cmd: String,

        /// Command argument
        arg: Option<String>,
    },

    /// Transmit a raw message (topic + message, or RF code + pulse on older hubs)
    Send {
        /// MQTT topic or RF code
        target: String,

        /// Message or pulse length
        payload: String,
    },

    /// Register a device
    Add {
        #[command(subcommand)]
        mode: AddMode,
    },

    /// Capture a code from a remote and print it, without adding a device
    Scan,

    /// Remove a device
    Delete {
        /// Device name
        name: String,
    },

    /// Show the state of a device
    Status {
        /// Device name
        name: String,
    },

    /// List registered devices
    List,

    /// Change a device record
    Update {
        #[command(subcommand)]
        field: UpdateCommand,
    },

    /// Set the hub IP address in the config file
    Ip {
        /// New hub IP address
        addr: String,
    },

    /// Set the hub port in the config file
    Port {
        /// New hub port
        port: u16,
    },
}

#[derive(Subcommand, Debug)]
enum AddMode {
    /// Topic-based device
    Device {
        /// Device name
        name: String,

        /// MQTT topic
        topic: String,

        /// Device type: outlet, strip, dimmable, cct, rgb, rgbw, rgbcct, custom (or 0-7)
        device_type: String,

        /// Relay count for strips, comma-separated command list for custom devices
        commands: Option<String>,
    },

    /// Learn the code by pressing a button on the remote
    Scan {
        /// Device name
        name: String,
    },

    /// RF device from one known ON or OFF code
    Code {
        /// Device name
        name: String,

        /// ON or OFF code
        code: i64,

        /// Pulse length
        pulse: u32,
    },

    /// RF device from a known ON/OFF pair
    Pair {
        /// Device name
        name: String,

        /// ON code
        on: i64,

        /// OFF code
        off: i64,

        /// Pulse length
        pulse: u32,
    },
}

#[derive(Subcommand, Debug)]
enum UpdateCommand {
    /// Rename a device
    Name {
        /// Current device name
        name: String,

        /// New device name
        new_name: String,
    },

    /// Move a device to a new MQTT topic
    Topic {
        /// Device name
        name: String,

        /// New MQTT topic
        topic: String,
    },

    /// Ask the hub to refresh a device's state
    State {
        /// Device name
        name: String,
    },
}

/// What one invocation does once connected
enum Plan {
    Plain(Command),
    Sniff,
    Scan { name: String },
    Code(DeviceAddRequest),
    Pair(DeviceAddRequest),
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    // Initialize tracing/logging
    let default_filter = if args.verbose { "kisslight=debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(args.verbose)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        tracing::debug!("command failed: {:?}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;

    // Local configuration only, never touches the network
    match &args.command {
        Commands::Ip { addr } => {
            config.set_ip(addr)?;
            config.save(&config_path)?;
            println!("Hub IP set to {}.", config.hub_ip);
            return Ok(());
        }
        Commands::Port { port } => {
            config.set_port(*port)?;
            config.save(&config_path)?;
            println!("Hub port set to {}.", config.hub_port);
            return Ok(());
        }
        _ => {}
    }

    if let Some(hub) = args.hub {
        config.hub_ip = hub.ip();
        config.hub_port = hub.port();
    }

    let plan = plan(args.command, config.protocol)?;

    tracing::debug!(
        "kisslight v{} -> {} ({})",
        kisslight::VERSION,
        config.hub_addr(),
        config.protocol
    );
    let mut client = HubClient::connect(&config)?;
    execute(&mut client, plan)?;
    client.close()
}

/// Turn arguments into a validated plan before any network I/O
///
/// Request forms the configured hub would misparse are refused here, so a
/// wrong protocol setting never reaches the hub.
fn plan(command: Commands, version: ProtocolVersion) -> Result<Plan> {
    let command = match command {
        Commands::Toggle { name } => Command::Toggle { name },
        Commands::Set { name, cmd, arg } => Command::Set {
            name,
            command: cmd,
            arg,
        },
        Commands::Send { target, payload } => match version.generation() {
            Generation::Mqtt => Command::Transmit {
                topic: target,
                message: payload,
            },
            Generation::Rf => Command::TransmitCode {
                code: parse_number("RF code", &target)?,
                pulse: parse_number("pulse", &payload)?,
            },
        },
        Commands::Add { mode } => match mode {
            AddMode::Device {
                name,
                topic,
                device_type,
                commands,
            } => Command::AddDevice {
                name,
                topic,
                device_type: device_type.parse::<DeviceType>()?,
                commands,
            },
            AddMode::Scan { name } => {
                Command::Sniff.check_generation(version)?;
                return Ok(Plan::Scan { name });
            }
            AddMode::Code { name, code, pulse } => {
                let learned = LearnedCode::new(code, pulse);
                let request = DeviceAddRequest::from_learned(name, learned)?;
                check_add(&request, version)?;
                return Ok(Plan::Code(request));
            }
            AddMode::Pair {
                name,
                on,
                off,
                pulse,
            } => {
                let request = DeviceAddRequest::from_codes(name, on, off, pulse)?;
                check_add(&request, version)?;
                return Ok(Plan::Pair(request));
            }
        },
        Commands::Scan => {
            Command::Sniff.check_generation(version)?;
            return Ok(Plan::Sniff);
        }
        Commands::Delete { name } => Command::Delete { name },
        Commands::Status { name } => Command::Status { name },
        Commands::List => Command::List,
        Commands::Update { field } => match field {
            UpdateCommand::Name { name, new_name } => Command::Update {
                field: UpdateField::Name,
                name,
                value: Some(new_name),
            },
            UpdateCommand::Topic { name, topic } => Command::Update {
                field: UpdateField::Topic,
                name,
                value: Some(topic),
            },
            UpdateCommand::State { name } => Command::Update {
                field: UpdateField::State,
                name,
                value: None,
            },
        },
        Commands::Ip { .. } | Commands::Port { .. } => {
            return Err(KlError::Usage("ip/port are handled locally".to_string()))
        }
    };

    command.validate()?;
    command.check_generation(version)?;
    Ok(Plan::Plain(command))
}

fn check_add(request: &DeviceAddRequest, version: ProtocolVersion) -> Result<()> {
    let command = request.to_command();
    command.validate()?;
    command.check_generation(version)
}

fn parse_number<T: std::str::FromStr>(what: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| KlError::Usage(format!("{} must be an integer: {:?}", what, raw)))
}

fn execute(
    client: &mut HubClient<impl std::io::BufRead, impl std::io::Write>,
    plan: Plan,
) -> Result<()> {
    match plan {
        Plan::Plain(command) => {
            let outcome = client.execute(&command)?;
            print_outcome(&command, &outcome);
        }
        Plan::Sniff => {
            println!("Scanning, press the button on the remote now...");
            let learned = client.scan()?;
            print_scanned(&learned);
        }
        Plan::Scan { name } => {
            println!("Scanning, press the button on the remote now...");
            let added = client.add_by_scan(&name)?;
            print_added(&added);
        }
        Plan::Code(request) => {
            let added = client.add_code(&request.name, request.on_code, request.pulse)?;
            print_added(&added);
        }
        Plan::Pair(request) => {
            let added = client.add_pair(
                &request.name,
                request.on_code,
                request.off_code,
                request.pulse,
            )?;
            print_added(&added);
        }
    }
    Ok(())
}

fn print_outcome(command: &Command, outcome: &kisslight::client::Outcome) {
    use kisslight::client::Outcome;

    match (command, outcome) {
        (Command::List, Outcome::Lines { lines, .. }) if lines.is_empty() => {
            println!("No devices registered.");
        }
        (Command::List, Outcome::Lines { lines, .. }) => {
            println!("{} device(s):", lines.len());
            for line in lines {
                println!("  {}", line);
            }
        }
        (Command::Status { name }, Outcome::Lines { lines, .. }) => {
            println!("{}:", name);
            for line in lines {
                println!("  {}", line);
            }
        }
        (Command::Toggle { name }, _) => println!("Device {} toggled.", name),
        (Command::Delete { name }, _) => println!("Device {} deleted.", name),
        (Command::AddDevice { name, .. }, _) => println!("Device {} added.", name),
        (Command::Transmit { topic, message }, _) => println!("Sent {} to {}.", message, topic),
        (Command::TransmitCode { code, pulse }, _) => {
            println!("Sent code {} with pulse {}.", code, pulse)
        }
        (_, outcome) => println!("{}", outcome.reply().reason()),
    }
}

fn print_scanned(learned: &LearnedCode) {
    let role = match classify(learned.code) {
        Some(CodeRole::On) => "On was scanned.",
        Some(CodeRole::Off) => "Off was scanned.",
        None => "Code is invalid.",
    };
    println!(
        "Scanning successful, Code={}, Pulse={}, {}",
        learned.code, learned.pulse, role
    );
}

fn print_added(added: &DeviceAddRequest) {
    println!(
        "Device {} added (on {}, off {}, pulse {}).",
        added.name, added.on_code, added.off_code, added.pulse
    );
}
