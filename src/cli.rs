//! Command line entry points.
//!
//! `serve` (the default) runs the HTTP API. `keygen` prints a product key for
//! a privileged signup, which is how the first ADMIN of a fresh deployment
//! gets in: only an ADMIN can mint keys over HTTP.

use clap::{Parser, Subcommand};

use crate::auth::proof::SignupProofs;
use crate::auth::roles::Role;
use crate::auth::services::normalize_email;

#[derive(Debug, Parser)]
#[command(name = "homelist", about = "Home listing API", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve,

    /// Print a product key for a REALTOR or ADMIN signup
    Keygen {
        /// Email the key is bound to
        #[arg(short, long)]
        email: String,

        /// REALTOR or ADMIN
        #[arg(short, long)]
        role: Role,
    },
}

/// Product key for `email` signing up as `role`, keyed by `secret`.
pub fn keygen(secret: &str, email: &str, role: Role) -> anyhow::Result<String> {
    anyhow::ensure!(
        role.is_privileged(),
        "{role} signups do not need a product key"
    );
    let email = normalize_email(email);
    anyhow::ensure!(!email.is_empty(), "email must not be empty");
    let proofs = SignupProofs::new(secret)?;
    Ok(proofs.generate(&email, role))
}
