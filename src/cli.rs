use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "runzim")]
#[command(version)]
#[command(about = "A Rust reader and extractor for ZIM-style archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  runzim wiki.zim                    open wiki.zim and hold it until Ctrl-C\n  \
  runzim -l wiki.zim                 list entries in wiki.zim\n  \
  runzim -d out wiki.zim -x '*.png'  extract everything except PNG images\n  \
  runzim -p wiki.zim A/Main.html     print one entry to stdout")]
pub struct Cli {
    /// Archive path
    #[arg(value_name = "ARCHIVE", env = "RUNZIM_ARCHIVE")]
    pub file: String,

    /// Entries to extract or print (default: all); `*` and `?` wildcards allowed
    #[arg(value_name = "ENTRIES")]
    pub entries: Vec<String>,

    /// List entries (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely, with header details and entry ranges
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Write entry contents to stdout, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract entries into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude entries that follow
    #[arg(short = 'x', value_name = "ENTRY", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// No listing, printing or extraction requested: hold the archive open
    pub fn is_hold(&self) -> bool {
        !(self.list || self.verbose || self.pipe || self.extract_dir.is_some())
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        if self.is_very_quiet() {
            "error"
        } else if self.is_quiet() {
            "warn"
        } else {
            "info"
        }
    }

    /// Whether an entry is selected by the positional filters and `-x`
    pub fn selects(&self, name: &str) -> bool {
        if !self.entries.is_empty() && !self.entries.iter().any(|p| matches_entry(p, name)) {
            return false;
        }
        !self.exclude.iter().any(|x| matches_entry(x, name))
    }
}

/// Match a user pattern against an entry name.
///
/// Patterns with `*` or `?` are globs over the full name; others must equal
/// the full name or its last path segment.
fn matches_entry(pattern: &str, name: &str) -> bool {
    if pattern.contains(['*', '?']) {
        return glob_match(pattern, name);
    }
    let basename = name.rsplit('/').next().unwrap_or(name);
    name == pattern || basename == pattern
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            // Try matching zero characters, or consume one and keep the star
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}
