//! CLI subcommand definitions

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Sign in as a member, or as an administrator with --admin
    Login {
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Sign in through the auth service as an administrator
        #[arg(long)]
        admin: bool,
    },
    /// Create a member account
    Register {
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and forget the local session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Upload a clothing photo and list similar items
    Upload {
        image: PathBuf,
        /// Also download every matched image into this directory
        #[arg(long, value_name = "DIR")]
        save_matches: Option<PathBuf>,
    },
    /// Check that the prediction backend is up
    Ping,
    /// Save an image and its JSON label into the clothes folder (admin only)
    Save {
        image: Option<PathBuf>,
        /// Base filename (defaults to the image's name without extension)
        #[arg(short, long)]
        name: Option<String>,
        /// Label JSON text
        #[arg(long, conflicts_with = "label_file")]
        label: Option<String>,
        /// Read the label JSON from a file
        #[arg(long, value_name = "FILE")]
        label_file: Option<PathBuf>,
        /// Clothes folder to write into (enables direct writes)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
        /// Create the clothes folder if it does not exist
        #[arg(long)]
        create_dir: bool,
        /// Deliver the files as downloads even if a clothes folder is configured
        #[arg(long, conflicts_with = "dir")]
        download: bool,
    },
    /// List labelled items in the clothes folder
    Catalog {
        /// Clothes folder to scan
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("fitcheck").chain(args.iter().copied()))
    }

    #[test]
    fn save_accepts_label_text() {
        let cli = parse(&["save", "photo.PNG", "-n", "denim shirt", "--label", "{}"]).unwrap();
        match cli.command {
            Commands::Save {
                image, name, label, ..
            } => {
                assert_eq!(image, Some(PathBuf::from("photo.PNG")));
                assert_eq!(name.as_deref(), Some("denim shirt"));
                assert_eq!(label.as_deref(), Some("{}"));
            }
            _ => panic!("expected save"),
        }
    }

    #[test]
    fn label_and_label_file_conflict() {
        assert!(parse(&["save", "a.png", "--label", "{}", "--label-file", "a.json"]).is_err());
    }

    #[test]
    fn download_and_dir_conflict() {
        assert!(parse(&["save", "a.png", "--dir", "/tmp", "--download"]).is_err());
    }

    #[test]
    fn login_admin_flag() {
        let cli = parse(&["login", "jane@x", "--admin", "--password", "pw"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Login { admin: true, .. }
        ));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(parse(&[]).is_err());
    }
}
