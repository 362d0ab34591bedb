//! Denylist CLI - publish, inspect and audit signed certificate denylists

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use denylist::{
    cert::Certificate,
    entry::{Denylist, Entry},
    jws::{self, Algorithm},
    key::{KeyPair, PublicKey},
    membership, pem_utils,
};
use tracing_subscriber::EnvFilter;

/// The signer key is only taken from the environment, never from the command line.
const PRIVATE_KEY_ENV: &str = "DENYLIST_PRIVATEKEY_PEM";

/// Reason recorded by `dumpcert` when none is given; meant to be edited.
const DEFAULT_REASON: &str = "TODO: Give me one reason, give me just one reason why";

/// Denylist - signed X.509 certificate denylists
#[derive(Parser)]
#[command(name = "denylist", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign the entries of a denylist file and print the compact JWS
    ///
    /// The signer private key (PKCS#8 or PKCS#1 PEM) is read from the
    /// DENYLIST_PRIVATEKEY_PEM environment variable.
    Publish {
        /// JSON array of denylist entries
        #[arg(long, default_value = "denylist.json")]
        input: PathBuf,

        /// JWS signature algorithm
        #[arg(long, default_value_t = Algorithm::EdDSA)]
        algorithm: Algorithm,
    },

    /// Print the denylist entry for a certificate
    Dumpcert {
        /// PEM certificate file
        #[arg(long)]
        cert: PathBuf,

        /// Reason to record in the entry
        #[arg(long, default_value = DEFAULT_REASON)]
        reason: String,
    },

    /// Check that every certificate in a directory is on the denylist
    Audit {
        /// Directory of PEM certificate files
        #[arg(long, default_value = "certs")]
        certs: PathBuf,

        /// Signed denylist (compact JWS)
        #[arg(long, default_value = "out/denylist.jws")]
        denylist: PathBuf,

        /// Trust anchor: public key or certificate PEM
        #[arg(long, default_value = "out/pubkey.pem")]
        public_key: PathBuf,

        /// Expected JWS signature algorithm
        #[arg(long, default_value_t = Algorithm::EdDSA)]
        algorithm: Algorithm,
    },

    /// Generate a new denylist signing key pair
    Keygen {
        /// Key type
        #[arg(long, value_enum, default_value_t = KeyType::Ed25519)]
        key_type: KeyType,

        /// Directory to write privkey.pem and pubkey.pem into
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KeyType {
    Ed25519,
    P256,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Publish { input, algorithm } => {
            let private_key_pem = signer_key_pem(std::env::var(PRIVATE_KEY_ENV).ok())?;
            cmd_publish(&input, algorithm, &private_key_pem).map(|_| ExitCode::SUCCESS)
        }

        Commands::Dumpcert { cert, reason } => {
            cmd_dumpcert(&cert, reason).map(|_| ExitCode::SUCCESS)
        }

        Commands::Audit {
            certs,
            denylist,
            public_key,
            algorithm,
        } => cmd_audit(&certs, &denylist, &public_key, algorithm),

        Commands::Keygen { key_type, out_dir } => {
            cmd_keygen(key_type, &out_dir).map(|_| ExitCode::SUCCESS)
        }
    }
}

fn signer_key_pem(value: Option<String>) -> Result<String> {
    match value {
        Some(pem) if !pem.trim().is_empty() => Ok(pem),
        Some(_) => bail!("{PRIVATE_KEY_ENV} environment variable must not be empty"),
        None => bail!("{PRIVATE_KEY_ENV} environment variable is not set"),
    }
}

fn cmd_publish(input: &Path, algorithm: Algorithm, private_key_pem: &str) -> Result<()> {
    let data = std::fs::read(input).with_context(|| format!("error reading {}", input.display()))?;
    let denylist = Denylist::from_json(&data)
        .with_context(|| format!("error parsing entries in {}", input.display()))?;

    let key = KeyPair::from_pem(private_key_pem).context("error parsing signer key")?;

    let signed = jws::sign(&denylist, &key, algorithm).context("error signing denylist")?;
    println!("{signed}");
    Ok(())
}

fn cmd_dumpcert(path: &Path, reason: String) -> Result<()> {
    let pem = pem_utils::read_to_string(path)?;
    let cert = Certificate::from_pem(&pem)
        .with_context(|| format!("error parsing certificate {}", path.display()))?;

    let entry = Entry::from_certificate(&cert, reason);
    println!("{}", entry.to_json_pretty()?);
    Ok(())
}

fn cmd_audit(
    certs_dir: &Path,
    denylist_path: &Path,
    public_key_path: &Path,
    algorithm: Algorithm,
) -> Result<ExitCode> {
    let trust_anchor = PublicKey::from_pem(&pem_utils::read_to_string(public_key_path)?)
        .with_context(|| format!("error parsing trust anchor {}", public_key_path.display()))?;

    let token = pem_utils::read_to_string(denylist_path)?;
    let denylist = jws::verify(token.trim(), &trust_anchor, algorithm)
        .with_context(|| format!("error verifying {}", denylist_path.display()))?;
    tracing::info!(entries = denylist.len(), "denylist verified");

    let loaded = pem_utils::load_certificates_from_dir(certs_dir)?;
    let certs: Vec<Certificate> = loaded.iter().map(|(_, cert)| cert.clone()).collect();
    let report = membership::audit(&certs, &denylist);

    for ((path, _), result) in loaded.iter().zip(&report.results) {
        let verdict = if result.is_covered() { "PASS" } else { "FAIL" };
        tracing::info!(
            path = %path.display(),
            covered = result.is_covered(),
            degraded = result.thumbprint_degraded,
            "audited certificate"
        );
        println!(
            "{verdict}: {} (issuer={}, serial={})",
            path.display(),
            result.issuer,
            result.serial_number
        );
    }

    let uncovered = report.uncovered();
    if uncovered.is_empty() {
        println!("all {} certificate(s) are on the denylist", report.results.len());
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{} certificate(s) missing from the denylist", uncovered.len());
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_keygen(key_type: KeyType, out_dir: &Path) -> Result<()> {
    let key = match key_type {
        KeyType::Ed25519 => KeyPair::generate_ed25519(),
        KeyType::P256 => KeyPair::generate_ecdsa_p256(),
    };

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("error creating {}", out_dir.display()))?;

    let private_path = out_dir.join("privkey.pem");
    let public_path = out_dir.join("pubkey.pem");
    std::fs::write(&private_path, key.to_pkcs8_pem()?)
        .with_context(|| format!("error writing {}", private_path.display()))?;
    std::fs::write(&public_path, key.public_key().to_pem()?)
        .with_context(|| format!("error writing {}", public_path.display()))?;

    println!(
        "wrote {} key pair: {}, {} (use --algorithm {})",
        key.key_type(),
        private_path.display(),
        public_path.display(),
        key.default_algorithm()
    );
    Ok(())
}
