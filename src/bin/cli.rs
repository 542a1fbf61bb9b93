//! rpcgate CLI Client
//!
//! Command-line interface for calling one RPC on an rpcgate server.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rpcgate::protocol::{Body, ObjectId, ObjectKind, Request, Value};
use rpcgate::{Client, ConfigGraph};

/// Every function with its arguments, printed by `--list`
const PROTOTYPES: &[(&str, &str)] = &[
    ("ping", ""),
    ("get", "<target> field=<name>"),
    ("set", "<target> field=<name> value=<value>"),
    ("add-host", "name=<name> address=<address>"),
    ("add-service", "host=<host> description=<description>"),
    ("add-contact", "name=<name> email=<email>"),
    (
        "schedule-downtime",
        "host=<host> [service=<description>] start=<unix> end=<unix> author=<a> comment=<c>",
    ),
    ("delete-downtime", "id=<id>"),
    ("list", "kind=<host|service|contact|downtime>"),
    ("shutdown", ""),
    ("restart", ""),
];

/// rpcgate CLI
#[derive(Parser, Debug)]
#[command(name = "rpcgate-cli")]
#[command(about = "CLI for an rpcgate server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long = "end-point", default_value = "127.0.0.1:4242")]
    end_point: String,

    /// Enable TLS
    #[arg(short, long)]
    ssl: bool,

    /// CA certificate trusted for the server certificate (required with --ssl)
    #[arg(short, long, requires = "ssl")]
    cacert: Option<PathBuf>,

    /// Name expected in the server certificate
    #[arg(long, default_value = "localhost")]
    server_name: String,

    /// List all prototypes
    #[arg(short, long)]
    list: bool,

    /// Function to call
    #[arg(required_unless_present = "list")]
    function: Option<String>,

    /// Function arguments, as `key=value` or `key value`
    #[arg(trailing_var_arg = true)]
    arguments: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.list {
        show_prototypes();
        return ExitCode::SUCCESS;
    }

    let function = args.function.clone().unwrap_or_default();
    let request = match parse_arguments(&args.arguments).and_then(|kv| build_request(&function, &kv)) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = if args.ssl {
        match &args.cacert {
            Some(cacert) => Client::connect_tls(&args.end_point, &args.server_name, cacert),
            None => {
                eprintln!("error: --ssl requires --cacert");
                return ExitCode::FAILURE;
            }
        }
    } else {
        Client::connect(&args.end_point)
    };

    let mut client = match client {
        Ok(client) => client,
        Err(e) => {
            eprintln!("error: cannot resolve {}: {}", args.end_point, e);
            return ExitCode::FAILURE;
        }
    };

    match client.call(&request) {
        Ok(response) => match response.body {
            Body::Empty => {
                println!("ok");
                ExitCode::SUCCESS
            }
            Body::Value(value) => {
                println!("{}", value);
                ExitCode::SUCCESS
            }
            Body::Names(names) => {
                for name in names {
                    println!("{}", name);
                }
                ExitCode::SUCCESS
            }
            Body::Id(id) => {
                println!("{}", id);
                ExitCode::SUCCESS
            }
            Body::Fault { reason, detail } => {
                eprintln!("{} {}", reason, detail);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("error: call to {} failed: {}", args.end_point, e);
            ExitCode::FAILURE
        }
    }
}

fn show_prototypes() {
    for (name, params) in PROTOTYPES {
        println!("{} {}", name, params);
    }
    println!();
    println!("<target>: host=<name> [service=<description>] | contact=<name> | downtime=<id>");
    for kind in [
        ObjectKind::Host,
        ObjectKind::Service,
        ObjectKind::Contact,
        ObjectKind::Downtime,
    ] {
        println!("{:?} fields: {}", kind, ConfigGraph::field_names(kind).join(", "));
    }
}

/// Arguments can be given as `key=val` or `key val`
fn parse_arguments(raw: &[String]) -> Result<HashMap<String, String>, String> {
    let mut args = HashMap::new();
    let mut iter = raw.iter();
    while let Some(item) = iter.next() {
        match item.split_once('=') {
            Some((key, value)) => {
                args.insert(key.to_string(), value.to_string());
            }
            None => {
                let value = iter
                    .next()
                    .ok_or_else(|| format!("argument `{}' has no value", item))?;
                args.insert(item.clone(), value.clone());
            }
        }
    }
    Ok(args)
}

fn required<'a>(args: &'a HashMap<String, String>, key: &str) -> Result<&'a str, String> {
    args.get(key)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument `{}'", key))
}

fn required_int(args: &HashMap<String, String>, key: &str) -> Result<i64, String> {
    required(args, key)?
        .parse()
        .map_err(|_| format!("argument `{}' must be an integer", key))
}

/// `true`/`false` and integers keep their type, anything else is text
fn parse_value(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => raw
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Text(raw.to_string())),
    }
}

fn parse_target(args: &HashMap<String, String>) -> Result<ObjectId, String> {
    if let Some(id) = args.get("downtime") {
        let id = id
            .parse()
            .map_err(|_| "argument `downtime' must be an integer".to_string())?;
        return Ok(ObjectId::downtime(id));
    }
    if let Some(name) = args.get("contact") {
        return Ok(ObjectId::contact(name.as_str()));
    }
    let host = required(args, "host")?;
    Ok(match args.get("service") {
        Some(description) => ObjectId::service(host, description.as_str()),
        None => ObjectId::host(host),
    })
}

fn parse_kind(raw: &str) -> Result<ObjectKind, String> {
    match raw {
        "host" => Ok(ObjectKind::Host),
        "service" => Ok(ObjectKind::Service),
        "contact" => Ok(ObjectKind::Contact),
        "downtime" => Ok(ObjectKind::Downtime),
        other => Err(format!("unknown object kind `{}'", other)),
    }
}

fn build_request(function: &str, args: &HashMap<String, String>) -> Result<Request, String> {
    let request = match function {
        "ping" => Request::Ping,
        "get" => Request::Get {
            target: parse_target(args)?,
            field: required(args, "field")?.to_string(),
        },
        "set" => Request::Set {
            target: parse_target(args)?,
            field: required(args, "field")?.to_string(),
            value: parse_value(required(args, "value")?),
        },
        "add-host" => Request::AddHost {
            name: required(args, "name")?.to_string(),
            address: required(args, "address")?.to_string(),
        },
        "add-service" => Request::AddService {
            host: required(args, "host")?.to_string(),
            description: required(args, "description")?.to_string(),
        },
        "add-contact" => Request::AddContact {
            name: required(args, "name")?.to_string(),
            email: required(args, "email")?.to_string(),
        },
        "schedule-downtime" => Request::ScheduleDowntime {
            host: required(args, "host")?.to_string(),
            service: args.get("service").cloned(),
            start: required_int(args, "start")?,
            end: required_int(args, "end")?,
            author: required(args, "author")?.to_string(),
            comment: required(args, "comment")?.to_string(),
        },
        "delete-downtime" => Request::DeleteDowntime {
            id: required(args, "id")?
                .parse()
                .map_err(|_| "argument `id' must be an integer".to_string())?,
        },
        "list" => Request::List {
            kind: parse_kind(required(args, "kind")?)?,
        },
        "shutdown" => Request::ProcessShutdown,
        "restart" => Request::ProcessRestart,
        other => return Err(format!("unknown function `{}' (see --list)", other)),
    };
    Ok(request)
}
