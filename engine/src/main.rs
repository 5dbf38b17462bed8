//! StreamSeal 命令行入口
//!
//! 用法：
//!   streamseal encrypt <input> <output> [--password P] [--algorithm A] [--chunk-size N]
//!   streamseal decrypt <input> <output> [--password P]
//!
//! 未给出 `--password` 时从终端读取（不回显），加密时要求再输入一次确认。
//! 所有实际逻辑都委托给 `streamseal` 库。

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use streamseal::{AeadAlgorithm, Engine, EngineConfig, Secret};

#[derive(Debug, Parser)]
#[command(name = "streamseal", version, about = "Password-based streaming file encryption")]
struct Cli {
    /// 提高日志级别（-v: debug，-vv: trace）
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TOML 配置文件
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 加密文件
    Encrypt {
        input: PathBuf,
        output: PathBuf,

        #[arg(long)]
        password: Option<String>,

        /// xchacha20-poly1305 或 aes-256-gcm
        #[arg(long)]
        algorithm: Option<AeadAlgorithm>,

        /// 明文 chunk 大小（字节）
        #[arg(long, value_name = "BYTES")]
        chunk_size: Option<u32>,
    },
    /// 解密文件
    Decrypt {
        input: PathBuf,
        output: PathBuf,

        #[arg(long)]
        password: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "streamseal=debug",
            _ => "streamseal=trace",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Encrypt {
            input,
            output,
            password,
            algorithm,
            chunk_size,
        } => {
            let mut config = config;
            if let Some(algorithm) = algorithm {
                config = config.with_algorithm(algorithm);
            }
            if let Some(chunk_size) = chunk_size {
                config = config.with_chunk_size(chunk_size);
            }

            let engine = Engine::new(config).context("invalid engine configuration")?;
            let secret = read_secret(password, true)?;

            let written = engine
                .encrypt_file(&input, &output, secret)
                .with_context(|| format!("failed to encrypt {}", input.display()))?;
            info!(bytes = written, output = %output.display(), "encrypted");
        }
        Command::Decrypt {
            input,
            output,
            password,
        } => {
            let engine = Engine::new(config).context("invalid engine configuration")?;
            let secret = read_secret(password, false)?;

            let written = engine
                .decrypt_file(&input, &output, secret)
                .with_context(|| format!("failed to decrypt {}", input.display()))?;
            info!(bytes = written, output = %output.display(), "decrypted");
        }
    }

    Ok(())
}

fn read_secret(password: Option<String>, confirm: bool) -> Result<Secret> {
    if let Some(password) = password {
        return Ok(Secret::from(password));
    }

    let first = Secret::from(
        rpassword::prompt_password("Password: ").context("failed to read password")?,
    );

    if confirm {
        let second = Secret::from(
            rpassword::prompt_password("Confirm password: ").context("failed to read password")?,
        );
        if first.expose() != second.expose() {
            bail!("passwords do not match");
        }
    }

    Ok(first)
}
