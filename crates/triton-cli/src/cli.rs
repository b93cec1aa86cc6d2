//! Command-line argument parsing with clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use triton_api::WaitOptions;

/// Triton CLI: manage CloudAPI instances, images, networks and more.
#[derive(Parser, Debug, Clone)]
#[command(name = "triton")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long)]
    pub verbose: bool,

    /// Profile selection and overrides.
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Where the CloudAPI identity comes from.
///
/// A named profile is read from `<config dir>/profiles.d/<name>.json`; the
/// other flags override its fields or, without a profile, make one up.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileArgs {
    /// Named profile.
    #[arg(short, long, env = "TRITON_PROFILE")]
    pub profile: Option<String>,

    /// CloudAPI endpoint URL.
    #[arg(short = 'U', long, env = "TRITON_URL")]
    pub url: Option<String>,

    /// Account login.
    #[arg(short, long, env = "TRITON_ACCOUNT")]
    pub account: Option<String>,

    /// RBAC sub-user login.
    #[arg(short, long, env = "TRITON_USER")]
    pub user: Option<String>,

    /// Key fingerprint (MD5 or SHA256).
    #[arg(short, long, env = "TRITON_KEY_ID")]
    pub key_id: Option<String>,

    /// Private key file; without one the key is taken from ssh-agent.
    #[arg(long, env = "TRITON_KEY_FILE")]
    pub key_file: Option<PathBuf>,

    /// Skip TLS certificate verification.
    #[arg(short, long, env = "TRITON_TLS_INSECURE")]
    pub insecure: bool,

    /// Act as another account (operators only).
    #[arg(long)]
    pub act_as: Option<String>,

    /// RBAC roles to assume (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub role: Vec<String>,
}

/// Waiting for asynchronous actions.
#[derive(Args, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitArgs {
    /// Wait for the action to complete.
    #[arg(short, long)]
    pub wait: bool,

    /// Give up waiting after this many seconds.
    #[arg(long, value_name = "SECS", requires = "wait")]
    pub wait_timeout: Option<u64>,
}

impl WaitArgs {
    /// Wait options, if waiting was requested.
    #[must_use]
    pub fn options(self) -> Option<WaitOptions> {
        if !self.wait {
            return None;
        }
        Some(match self.wait_timeout {
            Some(secs) => WaitOptions::with_timeout(Duration::from_secs(secs)),
            None => WaitOptions::default(),
        })
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Instance management.
    #[command(alias = "inst")]
    Instance {
        /// Instance subcommand to execute.
        #[command(subcommand)]
        command: InstanceCommands,
    },

    /// Image management.
    #[command(alias = "img")]
    Image {
        /// Image subcommand to execute.
        #[command(subcommand)]
        command: ImageCommands,
    },

    /// Packages (instance sizes).
    #[command(alias = "pkg")]
    Package {
        /// Package subcommand to execute.
        #[command(subcommand)]
        command: LookupCommands,
    },

    /// Networks.
    #[command(alias = "net")]
    Network {
        /// Network subcommand to execute.
        #[command(subcommand)]
        command: LookupCommands,
    },

    /// Virtual private clouds.
    Vpc {
        /// VPC subcommand to execute.
        #[command(subcommand)]
        command: VpcCommands,
    },

    /// Shared volumes.
    #[command(alias = "vol")]
    Volume {
        /// Volume subcommand to execute.
        #[command(subcommand)]
        command: VolumeCommands,
    },

    /// Firewall rules.
    Fwrule {
        /// Firewall rule subcommand to execute.
        #[command(subcommand)]
        command: LookupCommands,
    },

    /// Account SSH keys.
    Key {
        /// Key subcommand to execute.
        #[command(subcommand)]
        command: LookupCommands,
    },

    /// Account details.
    Account,

    /// RBAC users, roles, policies and role tags.
    Rbac {
        /// RBAC subcommand to execute.
        #[command(subcommand)]
        command: RbacCommands,
    },

    /// Stream instance change events until interrupted.
    Changefeed(ChangefeedArgs),
}

/// List/get for simple resource kinds.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum LookupCommands {
    /// List all.
    #[command(alias = "ls")]
    List,

    /// Show one by id, short id or name.
    Get {
        /// Identifier.
        ident: String,
    },
}

/// Instance subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum InstanceCommands {
    /// List instances.
    #[command(alias = "ls")]
    List(ListInstancesArgs),

    /// Show one instance.
    Get {
        /// Instance id, short id or name.
        ident: String,
    },

    /// Provision an instance.
    Create(CreateInstanceArgs),

    /// Start instances.
    Start {
        /// Instance identifiers.
        #[arg(required = true)]
        idents: Vec<String>,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Stop instances.
    Stop {
        /// Instance identifiers.
        #[arg(required = true)]
        idents: Vec<String>,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Reboot instances.
    Reboot {
        /// Instance identifiers.
        #[arg(required = true)]
        idents: Vec<String>,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Delete instances.
    #[command(alias = "rm")]
    Delete {
        /// Instance identifiers.
        #[arg(required = true)]
        idents: Vec<String>,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Rename an instance.
    Rename {
        /// Instance identifier.
        ident: String,
        /// New name.
        name: String,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Resize an instance to another package.
    Resize {
        /// Instance identifier.
        ident: String,
        /// Package identifier.
        package: String,
    },

    /// Turn the instance firewall on.
    EnableFirewall {
        /// Instance identifier.
        ident: String,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Turn the instance firewall off.
    DisableFirewall {
        /// Instance identifier.
        ident: String,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Turn deletion protection on.
    EnableDeletionProtection {
        /// Instance identifier.
        ident: String,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Turn deletion protection off.
    DisableDeletionProtection {
        /// Instance identifier.
        ident: String,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Instance tags.
    Tag {
        /// Tag subcommand to execute.
        #[command(subcommand)]
        command: TagCommands,
    },

    /// Instance snapshots.
    Snapshot {
        /// Snapshot subcommand to execute.
        #[command(subcommand)]
        command: SnapshotCommands,
    },

    /// Instance NICs.
    Nic {
        /// NIC subcommand to execute.
        #[command(subcommand)]
        command: NicCommands,
    },
}

/// Filters for `instance list`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListInstancesArgs {
    /// Only instances with this name.
    #[arg(long)]
    pub name: Option<String>,

    /// Only instances in this state.
    #[arg(long)]
    pub state: Option<String>,

    /// Only instances of this image (UUID).
    #[arg(long)]
    pub image: Option<String>,

    /// Return at most this many instances (one request).
    #[arg(long)]
    pub limit: Option<u64>,
}

/// Arguments for `instance create`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateInstanceArgs {
    /// Image id, short id, name or name@version.
    pub image: String,

    /// Package id, short id or name.
    pub package: String,

    /// Instance name.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Network identifiers (repeatable).
    #[arg(short = 'N', long = "network")]
    pub networks: Vec<String>,

    /// Tags (KEY=VALUE, repeatable).
    #[arg(short, long = "tag", value_name = "KEY=VALUE")]
    pub tags: Vec<String>,

    /// Metadata (KEY=VALUE or KEY=@FILE, repeatable).
    #[arg(short, long = "metadata", value_name = "KEY=VALUE")]
    pub metadata: Vec<String>,

    /// Enable the instance firewall.
    #[arg(long)]
    pub firewall: bool,

    /// Enable deletion protection.
    #[arg(long)]
    pub deletion_protection: bool,

    /// Waiting.
    #[command(flatten)]
    pub wait: WaitArgs,
}

/// Instance tag subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TagCommands {
    /// List tags.
    #[command(alias = "ls")]
    List {
        /// Instance identifier.
        ident: String,
    },

    /// Add or update tags, keeping the others.
    Set {
        /// Instance identifier.
        ident: String,
        /// Tags (KEY=VALUE).
        #[arg(required = true, value_name = "KEY=VALUE")]
        tags: Vec<String>,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Replace all tags.
    Replace {
        /// Instance identifier.
        ident: String,
        /// Tags (KEY=VALUE).
        #[arg(value_name = "KEY=VALUE")]
        tags: Vec<String>,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Delete tags.
    #[command(alias = "rm")]
    Delete {
        /// Instance identifier.
        ident: String,
        /// Tag keys.
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        keys: Vec<String>,
        /// Delete every tag.
        #[arg(short, long)]
        all: bool,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },
}

/// Instance snapshot subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotCommands {
    /// List snapshots.
    #[command(alias = "ls")]
    List {
        /// Instance identifier.
        ident: String,
    },

    /// Snapshot an instance.
    Create {
        /// Instance identifier.
        ident: String,
        /// Snapshot name (server-generated if omitted).
        #[arg(short, long)]
        name: Option<String>,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Delete a snapshot.
    #[command(alias = "rm")]
    Delete {
        /// Instance identifier.
        ident: String,
        /// Snapshot name.
        name: String,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Boot an instance from a snapshot.
    Boot {
        /// Instance identifier.
        ident: String,
        /// Snapshot name.
        name: String,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },
}

/// Instance NIC subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum NicCommands {
    /// List NICs.
    #[command(alias = "ls")]
    List {
        /// Instance identifier.
        ident: String,
    },

    /// Add a NIC.
    Add {
        /// Instance identifier.
        ident: String,
        /// Network identifier.
        network: String,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Remove a NIC.
    #[command(alias = "rm")]
    Remove {
        /// Instance identifier.
        ident: String,
        /// NIC MAC address.
        mac: String,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },
}

/// Image subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ImageCommands {
    /// List images.
    #[command(alias = "ls")]
    List {
        /// Only images with this name.
        #[arg(long)]
        name: Option<String>,
        /// Only images of this OS.
        #[arg(long)]
        os: Option<String>,
    },

    /// Show one image.
    Get {
        /// Image id, short id, name or name@version.
        ident: String,
    },

    /// Update image attributes.
    Update(UpdateArgs),

    /// Delete images.
    #[command(alias = "rm")]
    Delete {
        /// Image identifiers.
        #[arg(required = true)]
        idents: Vec<String>,
    },
}

/// Arguments for `update` subcommands.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateArgs {
    /// Resource identifier.
    pub ident: String,

    /// Fields to set (KEY=VALUE).
    #[arg(value_name = "KEY=VALUE", required_unless_present = "file")]
    pub fields: Vec<String>,

    /// JSON object of fields to set (`-` for stdin).
    #[arg(short, long, conflicts_with = "fields")]
    pub file: Option<PathBuf>,
}

/// VPC subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum VpcCommands {
    /// List VPCs.
    #[command(alias = "ls")]
    List,

    /// Show one VPC.
    Get {
        /// VPC identifier.
        ident: String,
    },

    /// Update VPC attributes.
    Update(UpdateArgs),

    /// Delete a VPC.
    #[command(alias = "rm")]
    Delete {
        /// VPC identifier.
        ident: String,
    },
}

/// Volume subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum VolumeCommands {
    /// List volumes.
    #[command(alias = "ls")]
    List,

    /// Show one volume.
    Get {
        /// Volume identifier.
        ident: String,
    },

    /// Create a volume.
    Create {
        /// Volume name.
        #[arg(short, long)]
        name: Option<String>,
        /// Size such as `10G` or `512M`.
        #[arg(short, long)]
        size: Option<String>,
        /// Network identifiers (repeatable).
        #[arg(short = 'N', long = "network")]
        networks: Vec<String>,
        /// Volume type.
        #[arg(short = 't', long = "type")]
        volume_type: Option<String>,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Delete volumes.
    #[command(alias = "rm")]
    Delete {
        /// Volume identifiers.
        #[arg(required = true)]
        idents: Vec<String>,
        /// Waiting.
        #[command(flatten)]
        wait: WaitArgs,
    },
}

/// RBAC subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum RbacCommands {
    /// List users.
    Users,
    /// Show one user.
    User {
        /// User id, short id or login.
        ident: String,
    },
    /// List roles.
    Roles,
    /// Show one role.
    Role {
        /// Role identifier.
        ident: String,
    },
    /// List policies.
    Policies,
    /// Show one policy.
    Policy {
        /// Policy identifier.
        ident: String,
    },
    /// Show the role tags of a resource.
    RoleTags {
        /// Resource type (instance, image, network, ...).
        kind: String,
        /// Resource identifier.
        ident: String,
    },
    /// Replace the role tags of a resource.
    SetRoleTags {
        /// Resource type (instance, image, network, ...).
        kind: String,
        /// Resource identifier.
        ident: String,
        /// Role names (comma-separated; empty clears).
        #[arg(value_delimiter = ',')]
        roles: Vec<String>,
    },
}

/// Arguments for `changefeed`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangefeedArgs {
    /// Only these instances (UUIDs, repeatable).
    #[arg(long = "vm")]
    pub vms: Vec<String>,

    /// Only these sub-resources (repeatable; default all).
    #[arg(long = "sub")]
    pub sub_resources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_instance_list() {
        let cli = Cli::parse_from(["triton", "instance", "ls", "--state", "running"]);
        assert!(matches!(
            cli.command,
            Commands::Instance {
                command: InstanceCommands::List(ListInstancesArgs { state: Some(ref s), .. })
            } if s == "running"
        ));
    }

    #[test]
    fn cli_respects_format_flag() {
        let cli = Cli::parse_from(["triton", "--format", "json", "account"]);
        assert_eq!(cli.format, Format::Json);
        assert!(matches!(cli.command, Commands::Account));
    }

    #[test]
    fn cli_profile_flags() {
        let cli = Cli::parse_from([
            "triton",
            "-U",
            "https://cloudapi.example.com",
            "-a",
            "alice",
            "-k",
            "SHA256:abc",
            "--role",
            "ops,dev",
            "key",
            "list",
        ]);
        assert_eq!(cli.profile.url.as_deref(), Some("https://cloudapi.example.com"));
        assert_eq!(cli.profile.account.as_deref(), Some("alice"));
        assert_eq!(cli.profile.key_id.as_deref(), Some("SHA256:abc"));
        assert_eq!(cli.profile.role, vec!["ops".to_string(), "dev".to_string()]);
        assert!(matches!(
            cli.command,
            Commands::Key {
                command: LookupCommands::List
            }
        ));
    }

    #[test]
    fn cli_wait_args() {
        let cli = Cli::parse_from(["triton", "instance", "stop", "web", "db", "-w", "--wait-timeout", "30"]);
        let Commands::Instance {
            command: InstanceCommands::Stop { idents, wait },
        } = cli.command
        else {
            unreachable!("stop parses as stop")
        };
        assert_eq!(idents, vec!["web".to_string(), "db".to_string()]);
        assert_eq!(
            wait.options().and_then(|o| o.timeout),
            Some(Duration::from_secs(30))
        );
        assert_eq!(WaitArgs::default().options(), None);
    }

    #[test]
    fn cli_wait_timeout_requires_wait() {
        let res = Cli::try_parse_from(["triton", "instance", "start", "web", "--wait-timeout", "5"]);
        assert!(res.is_err());
    }

    #[test]
    fn cli_tag_delete_requires_keys_or_all() {
        assert!(Cli::try_parse_from(["triton", "instance", "tag", "delete", "web"]).is_err());
        assert!(Cli::try_parse_from(["triton", "instance", "tag", "delete", "web", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["triton", "instance", "tag", "rm", "web", "env", "role"]).is_ok());
    }

    #[test]
    fn cli_image_update_fields_or_file() {
        assert!(Cli::try_parse_from(["triton", "image", "update", "base-64"]).is_err());
        let cli = Cli::parse_from(["triton", "image", "update", "base-64", "name=foo", "version=2"]);
        assert!(matches!(
            cli.command,
            Commands::Image {
                command: ImageCommands::Update(UpdateArgs { ref fields, .. })
            } if fields.len() == 2
        ));
    }
}
