//! Signatures shipped with the binary.

use super::{MatchPart, Signature, SignatureError, SignatureSet};

use MatchPart::{Content, Extension, Filename, Path};

const SHELL_CONFIG: &str =
    "Shell configuration files can contain passwords, API keys, hostnames and other goodies";
const HASHCAT: &str = "Feed it to Hashcat and see if you're lucky";
const CREEPY: &str = "Now it's getting creepy...";
const FTP: &str = "Can contain credentials for FTP servers";

/// `(part, match, description, comment)` for exact-equality path signatures.
const SIMPLE_PATH: &[(MatchPart, &str, &str, Option<&str>)] = &[
    (Extension, ".pem", "Potential cryptographic private key", None),
    (
        Extension,
        ".log",
        "Log file",
        Some("Log files can contain secret HTTP endpoints, session IDs, API keys and other goodies"),
    ),
    (Extension, ".pkcs12", "Potential cryptographic key bundle", None),
    (Extension, ".p12", "Potential cryptographic key bundle", None),
    (Extension, ".pfx", "Potential cryptographic key bundle", None),
    (Extension, ".asc", "Potential cryptographic key bundle", None),
    (Filename, "otr.private_key", "Pidgin OTR private key", None),
    (Extension, ".ovpn", "OpenVPN client configuration file", None),
    (Extension, ".cscfg", "Azure service configuration schema file", None),
    (Extension, ".rdp", "Remote Desktop connection file", None),
    (Extension, ".mdf", "Microsoft SQL database file", None),
    (Extension, ".sdf", "Microsoft SQL server compact database file", None),
    (Extension, ".sqlite", "SQLite database file", None),
    (Extension, ".bek", "Microsoft BitLocker recovery key file", None),
    (Extension, ".tpm", "Microsoft BitLocker Trusted Platform Module password file", None),
    (Extension, ".fve", "Windows BitLocker full volume encrypted data file", None),
    (Extension, ".jks", "Java keystore file", None),
    (Extension, ".psafe3", "Password Safe database file", None),
    (
        Filename,
        "secret_token.rb",
        "Ruby On Rails secret token configuration file",
        Some("If the Rails secret token is known, it can allow for remote code execution (http://www.exploit-db.com/exploits/27527/)"),
    ),
    (
        Filename,
        "carrierwave.rb",
        "Carrierwave configuration file",
        Some("Can contain credentials for cloud storage systems such as Amazon S3 and Google Storage"),
    ),
    (
        Filename,
        "database.yml",
        "Potential Ruby On Rails database configuration file",
        Some("Can contain database credentials"),
    ),
    (
        Filename,
        "omniauth.rb",
        "OmniAuth configuration file",
        Some("The OmniAuth configuration file can contain client application secrets"),
    ),
    (
        Filename,
        "settings.py",
        "Django configuration file",
        Some("Can contain database credentials, cloud storage system credentials, and other secrets"),
    ),
    (Extension, ".agilekeychain", "1Password password manager database file", Some(HASHCAT)),
    (Extension, ".keychain", "Apple Keychain database file", None),
    (Extension, ".pcap", "Network traffic capture file", None),
    (Extension, ".gnucash", "GnuCash database file", None),
    (
        Filename,
        "jenkins.plugins.publish_over_ssh.BapSshPublisherPlugin.xml",
        "Jenkins publish over SSH plugin file",
        None,
    ),
    (Filename, "credentials.xml", "Potential Jenkins credentials file", None),
    (Extension, ".kwallet", "KDE Wallet Manager database file", None),
    (Filename, "LocalSettings.php", "Potential MediaWiki configuration file", None),
    (Extension, ".tblk", "Tunnelblick VPN configuration file", None),
    (Filename, "Favorites.plist", "Sequel Pro MySQL database manager bookmark file", None),
    (
        Filename,
        "configuration.user.xpl",
        "Little Snitch firewall configuration file",
        Some("Contains traffic rules for applications"),
    ),
    (Extension, ".dayone", "Day One journal file", Some(CREEPY)),
    (Filename, "journal.txt", "Potential jrnl journal file", Some(CREEPY)),
    (
        Filename,
        "knife.rb",
        "Chef Knife configuration file",
        Some("Can contain references to Chef servers"),
    ),
    (
        Filename,
        "proftpdpasswd",
        "cPanel backup ProFTPd credentials file",
        Some("Contains usernames and password hashes for FTP accounts"),
    ),
    (
        Filename,
        "robomongo.json",
        "Robomongo MongoDB manager configuration file",
        Some("Can contain credentials for MongoDB databases"),
    ),
    (Filename, "filezilla.xml", "FileZilla FTP configuration file", Some(FTP)),
    (Filename, "recentservers.xml", "FileZilla FTP recent servers file", Some(FTP)),
    (
        Filename,
        "ventrilo_srv.ini",
        "Ventrilo server configuration file",
        Some("Can contain passwords"),
    ),
    (
        Filename,
        "terraform.tfvars",
        "Terraform variable config file",
        Some("Can contain credentials for terraform providers"),
    ),
    (Filename, ".exports", "Shell configuration file", Some(SHELL_CONFIG)),
    (Filename, ".functions", "Shell configuration file", Some(SHELL_CONFIG)),
    (Filename, ".extra", "Shell configuration file", Some(SHELL_CONFIG)),
];

/// `(part, regex, description, comment)` for pattern path signatures. Evaluated after
/// [`SIMPLE_PATH`], in this order.
const PATTERN_PATH: &[(MatchPart, &str, &str, Option<&str>)] = &[
    (Filename, r"^.*_rsa$", "Private SSH key", None),
    (Filename, r"^.*_dsa$", "Private SSH key", None),
    (Filename, r"^.*_ed25519$", "Private SSH key", None),
    (Filename, r"^.*_ecdsa$", "Private SSH key", None),
    (Path, r"\.?ssh/config$", "SSH configuration file", None),
    (Extension, r"^\.key(pair)?$", "Potential cryptographic private key", None),
    (Filename, r"^\.?(bash_|zsh_|sh_|z)?history$", "Shell command history file", None),
    (Filename, r"^\.?mysql_history$", "MySQL client command history file", None),
    (Filename, r"^\.?psql_history$", "PostgreSQL client command history file", None),
    (Filename, r"^\.?pgpass$", "PostgreSQL password file", None),
    (Filename, r"^\.?irb_history$", "Ruby IRB console history file", None),
    (Path, r"\.?purple/accounts\.xml$", "Pidgin chat client account configuration file", None),
    (
        Path,
        r"\.?xchat2?/servlist_?\.conf$",
        "Hexchat/XChat IRC client server list configuration file",
        None,
    ),
    (Path, r"\.?irssi/config$", "Irssi IRC client configuration file", None),
    (
        Path,
        r"\.?recon-ng/keys\.db$",
        "Recon-ng web reconnaissance framework API key database",
        None,
    ),
    (
        Filename,
        r"^\.?dbeaver-data-sources.xml$",
        "DBeaver SQL database manager configuration file",
        None,
    ),
    (Filename, r"^\.?muttrc$", "Mutt e-mail client configuration file", None),
    (Filename, r"^\.?s3cfg$", "S3cmd configuration file", None),
    (Path, r"\.?aws/credentials$", "AWS CLI credentials file", None),
    (Filename, r"^sftp-config(\.json)?$", "SFTP connection configuration file", None),
    (Filename, r"^\.?trc$", "T command-line Twitter client configuration file", None),
    (Filename, r"^\.?gitrobrc$", "Gitrob configuration file", None),
    (Filename, r"^\.?(bash|zsh|csh)rc$", "Shell configuration file", Some(SHELL_CONFIG)),
    (
        Filename,
        r"^\.?(bash_|zsh_)?profile$",
        "Shell profile configuration file",
        Some(SHELL_CONFIG),
    ),
    (
        Filename,
        r"^\.?(bash_|zsh_)?aliases$",
        "Shell command alias configuration file",
        Some(SHELL_CONFIG),
    ),
    (Filename, r"config(\.inc)?\.php$", "PHP configuration file", None),
    (Extension, r"^\.key(store|ring)$", "GNOME Keyring database file", None),
    (Extension, r"^\.kdbx?$", "KeePass password manager database file", Some(HASHCAT)),
    (Extension, r"^\.sql(dump)?$", "SQL dump file", None),
    (Filename, r"^\.?htpasswd$", "Apache htpasswd file", None),
    (
        Filename,
        r"^(\.|_)?netrc$",
        "Configuration file for auto-login process",
        Some("Can contain username and password"),
    ),
    (
        Path,
        r"\.?gem/credentials$",
        "Rubygems credentials file",
        Some("Can contain API key for a rubygems.org account"),
    ),
    (Filename, r"^\.?tugboat$", "Tugboat DigitalOcean management tool configuration", None),
    (
        Path,
        r"doctl/config.yaml$",
        "DigitalOcean doctl command-line client configuration file",
        Some("Contains DigitalOcean API key and other information"),
    ),
    (Filename, r"^\.?git-credentials$", "git-credential-store helper credentials file", None),
    (
        Path,
        r"config/hub$",
        "GitHub Hub command-line client configuration file",
        Some("Can contain GitHub API access token"),
    ),
    (Filename, r"^\.?gitconfig$", "Git configuration file", None),
    (
        Path,
        r"\.?chef/(.*)\.pem$",
        "Chef private key",
        Some("Can be used to authenticate against Chef servers"),
    ),
    (
        Path,
        r"etc/shadow$",
        "Potential Linux shadow file",
        Some("Contains hashed passwords for system users"),
    ),
    (Path, r"etc/passwd$", "Potential Linux passwd file", Some("Contains system user information")),
    (
        Filename,
        r"^\.?dockercfg$",
        "Docker configuration file",
        Some("Can contain credentials for public or private Docker registries"),
    ),
    (
        Filename,
        r"^\.?npmrc$",
        "NPM configuration file",
        Some("Can contain credentials for NPM registries"),
    ),
    (Filename, r"^\.?env$", "Environment configuration file", None),
    (Path, r"credential", "Contains word: credential", None),
    (Path, r"password", "Contains word: password", None),
];

/// `(regex, description, comment)` for content signatures.
const CONTENT: &[(&str, &str, Option<&str>)] = &[
    (
        r"-----BEGIN (RSA |DSA |EC |OPENSSH |PGP |ENCRYPTED )?PRIVATE KEY( BLOCK)?-----",
        "Private key block",
        None,
    ),
    (r"\b(AKIA|ASIA)[0-9A-Z]{16}\b", "AWS access key ID", None),
    (
        r#"(?i)aws_?secret_?access_?key\s*[:=]\s*["']?[A-Za-z0-9/+=]{40}"#,
        "AWS secret access key",
        None,
    ),
    (r"\bgh[pousr]_[A-Za-z0-9]{36,255}\b", "GitHub access token", None),
    (r"\bglpat-[A-Za-z0-9_\-]{20}\b", "GitLab personal access token", None),
    (r"\bxox[abposr]-[A-Za-z0-9\-]{10,72}", "Slack token", None),
    (
        r"https://hooks\.slack\.com/services/T[A-Za-z0-9_]+/B[A-Za-z0-9_]+/[A-Za-z0-9_]+",
        "Slack incoming webhook URL",
        None,
    ),
    (r"\bAIza[0-9A-Za-z_\-]{35}\b", "Google API key", None),
    (r#""type"\s*:\s*"service_account""#, "Google Cloud service account key", None),
    (r"\b(sk|rk)_live_[0-9a-zA-Z]{24,99}\b", "Stripe live secret key", None),
    (r"\bSK[0-9a-fA-F]{32}\b", "Twilio API key", None),
    (r"\bSG\.[A-Za-z0-9_\-]{22}\.[A-Za-z0-9_\-]{43}\b", "SendGrid API key", None),
    (r"\bnpm_[A-Za-z0-9]{36}\b", "npm access token", None),
    (
        r"[a-zA-Z][a-zA-Z0-9+.\-]*://[^\s:@/]+:[^\s:@/]+@[^\s/]+",
        "Credentials embedded in URL",
        Some("Connection strings often carry a username and password"),
    ),
    (
        r#"(?i)\b(password|passwd|pwd|secret|api_?key|access_?token)\b\s*[:=]\s*["'][^"'\s]{6,}["']"#,
        "Hard-coded secret assignment",
        None,
    ),
];

/// The built-in signature table, in precedence order.
pub fn signature_set() -> Result<SignatureSet, SignatureError> {
    let mut path = Vec::with_capacity(SIMPLE_PATH.len() + PATTERN_PATH.len());
    path.extend(SIMPLE_PATH.iter().map(|&(part, text, description, comment)| {
        Signature::simple(part, text, description, comment)
    }));
    for &(part, pattern, description, comment) in PATTERN_PATH {
        path.push(Signature::pattern(part, pattern, description, comment)?);
    }

    let content = CONTENT
        .iter()
        .map(|&(pattern, description, comment)| {
            Signature::pattern(Content, pattern, description, comment)
        })
        .collect::<Result<Vec<_>, _>>()?;

    SignatureSet::new(path, content)
}
