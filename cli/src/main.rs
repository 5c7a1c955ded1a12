use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use zelus::config::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LOGIN_TIMEOUT_MS};
use zelus::resources::{self, Photo, Registration};
use zelus::{ApiError, ClientConfig, ConfigError, LoginError, RegisterError, SessionEvent, ZelusClient};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing credentials; pass --email/--password or set ZELUS_EMAIL/ZELUS_PASSWORD")]
    MissingCredentials,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("login failed: {0}")]
    Login(#[from] LoginError),
    #[error("{}", .0.message())]
    Api(#[from] ApiError),
    #[error("registration failed: {0}")]
    Register(#[from] RegisterError),
    #[error("could not read {path}: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON output: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "zelus-cli", about = "Zelus API command-line client")]
struct Cli {
    #[arg(long, env = "ZELUS_API_URL", default_value = "http://127.0.0.1:3333")]
    api_url: String,

    #[arg(long, env = "ZELUS_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "ZELUS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, env = "ZELUS_LOGIN_TIMEOUT_MS", default_value_t = DEFAULT_LOGIN_TIMEOUT_MS)]
    login_timeout_ms: u64,

    #[arg(long, env = "ZELUS_CONNECT_TIMEOUT_SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account with --email/--password. Does not log in.
    Register(RegisterArgs),
    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands that run after logging in.
#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Log in and print the session user.
    Login,
    Posts(PostsCommand),
    Categories,
    Departments,
    Banners,
    User(UserCommand),
    Comments(CommentsCommand),
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    cpf: String,
}

#[derive(Args, Debug)]
struct PostsCommand {
    #[command(subcommand)]
    command: PostsSubcommand,
}

#[derive(Subcommand, Debug)]
enum PostsSubcommand {
    List,
    Show {
        post_id: i64,
    },
    Create(PostCreateArgs),
    Denounce {
        post_id: i64,
    },
}

#[derive(Args, Debug)]
struct PostCreateArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    #[arg(long)]
    address: String,
    #[arg(long)]
    cep: String,
    #[arg(long)]
    neighborhood: String,
    #[arg(long)]
    category_id: i64,
    #[arg(long)]
    department_id: i64,
    #[arg(long, requires = "longitude", allow_hyphen_values = true)]
    latitude: Option<f64>,
    #[arg(long, requires = "latitude", allow_hyphen_values = true)]
    longitude: Option<f64>,
    #[arg(long, help = "Photo file to attach")]
    photo: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Subcommand, Debug)]
enum UserSubcommand {
    Show {
        /// Defaults to the logged-in user.
        user_id: Option<i64>,
    },
}

#[derive(Args, Debug)]
struct CommentsCommand {
    #[command(subcommand)]
    command: CommentsSubcommand,
}

#[derive(Subcommand, Debug)]
enum CommentsSubcommand {
    List { post_id: i64 },
    Add { post_id: i64, text: String },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::new(&cli.api_url)?;
    config.login_timeout = std::time::Duration::from_millis(cli.login_timeout_ms);
    config.connect_timeout = std::time::Duration::from_secs(cli.connect_timeout_secs);
    let client = ZelusClient::new(config)?;
    watch_session(&client);

    match cli.command {
        Command::Register(args) => run_register(&client, cli.email.as_deref(), cli.password.as_deref(), args).await,
        Command::Session(command) => {
            login(&client, cli.email.as_deref(), cli.password.as_deref()).await?;
            run_session(&client, command).await
        }
    }
}

fn watch_session(client: &ZelusClient) {
    let mut events = client.session().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let SessionEvent::Expired { message } = event {
                eprintln!("{message}");
            }
        }
    });
}

async fn login(client: &ZelusClient, email: Option<&str>, password: Option<&str>) -> Result<(), CliError> {
    let (Some(email), Some(password)) = (email, password) else {
        return Err(CliError::MissingCredentials);
    };
    client.login(email, password).await?;
    Ok(())
}

async fn run_register(
    client: &ZelusClient,
    email: Option<&str>,
    password: Option<&str>,
    args: RegisterArgs,
) -> Result<(), CliError> {
    let (Some(email), Some(password)) = (email, password) else {
        return Err(CliError::MissingCredentials);
    };
    let registration =
        Registration { name: args.name, cpf: args.cpf, email: email.to_owned(), password: password.to_owned() };
    resources::register_user(client, &registration).await?;
    eprintln!("registered {}", registration.normalized().email);
    Ok(())
}

async fn run_session(client: &ZelusClient, command: SessionCommand) -> Result<(), CliError> {
    match command {
        SessionCommand::Login => print_json(&client.session().user()),
        SessionCommand::Posts(posts) => run_posts(client, posts).await,
        SessionCommand::Categories => print_json(&resources::list_categories(client).await?),
        SessionCommand::Departments => print_json(&resources::list_departments(client).await?),
        SessionCommand::Banners => print_json(&resources::list_banners(client).await?),
        SessionCommand::User(user) => match user.command {
            UserSubcommand::Show { user_id } => {
                let user_id = match user_id {
                    Some(id) => id,
                    None => client.session().user().map(|u| u.id).ok_or(CliError::MissingCredentials)?,
                };
                print_json(&resources::get_user(client, user_id).await?)
            }
        },
        SessionCommand::Comments(comments) => match comments.command {
            CommentsSubcommand::List { post_id } => print_json(&resources::list_comments(client, post_id).await?),
            CommentsSubcommand::Add { post_id, text } => {
                print_json(&resources::create_comment(client, post_id, &text).await?)
            }
        },
    }
}

async fn run_posts(client: &ZelusClient, posts: PostsCommand) -> Result<(), CliError> {
    match posts.command {
        PostsSubcommand::List => print_json(&resources::list_posts(client).await?),
        PostsSubcommand::Show { post_id } => print_json(&resources::get_post(client, post_id).await?),
        PostsSubcommand::Create(args) => {
            let photo = match args.photo {
                Some(path) => Some(read_photo(path)?),
                None => None,
            };
            let form = resources::PostForm {
                title: args.title,
                description: args.description,
                address: args.address,
                cep: args.cep,
                neighborhood: args.neighborhood,
                category_id: args.category_id,
                department_id: args.department_id,
                coordinates: args.latitude.zip(args.longitude),
                photo,
            };
            print_json(&resources::create_post(client, form).await?)
        }
        PostsSubcommand::Denounce { post_id } => print_json(&resources::denounce_post(client, post_id).await?),
    }
}

fn read_photo(path: PathBuf) -> Result<Photo, CliError> {
    let bytes = std::fs::read(&path).map_err(|source| CliError::ReadFile { path: path.clone(), source })?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("photo.jpg")
        .to_owned();
    Ok(Photo { file_name, bytes })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
