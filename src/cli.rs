use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "shoebox", version, about = "Collect photos and videos into a date-organised archive")]
pub struct Cli {
    /// Archive root; the catalog lives inside it.
    #[arg(long, global = true)]
    pub archive: Option<PathBuf>,
    /// Read configuration from this file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// More logging: `-v` for debug, `-vv` for trace.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}
impl Cli {
    pub fn log_level(&self) -> Option<String> {
        match self.verbose {
            0 => None,
            1 => Some("debug".to_string()),
            _ => Some("trace".to_string()),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Copy dated media under each root into the archive.
    Collect {
        /// Ingest files again even if they are already catalogued.
        #[arg(long)]
        overwrite: bool,
        #[arg(required = true)]
        roots: Vec<PathBuf>,
    },
    /// Count catalogued photos.
    Size,
    /// Show the record behind archive paths; reads paths from stdin when
    /// none are given.
    Lookup { final_paths: Vec<String> },
    /// Print every record, ordered by archive path.
    Dump,
    /// Interactive shell with named lists.
    Shell,
}

/// One line typed into the shell.
#[derive(Debug, Parser)]
#[command(multicall = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Debug, Subcommand)]
pub enum ShellCommand {
    /// Copy dated media under each root into the archive.
    Collect {
        #[arg(long)]
        overwrite: bool,
        #[arg(required = true)]
        roots: Vec<PathBuf>,
    },
    /// Move the originals of a list under a directory and forget them.
    MoveFiles { list: String, output_dir: PathBuf },
    /// Delete the originals of a list and forget them.
    Delete { list: String },
    /// Build a list from original paths matching any pattern.
    MatchPath {
        name: String,
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Build a list from records whose tag matches any pattern.
    MatchTag {
        name: String,
        tag: String,
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Store the union of two lists.
    Merge { a: String, b: String, name: String },
    /// Store the intersection of two lists.
    Intersect { a: String, b: String, name: String },
    /// Print the original paths of a list.
    Show { list: String },
    /// Write the original paths of a list to a file.
    Write { list: String, file: PathBuf },
    /// Forget a list.
    Drop { list: String },
    /// Show every list and its size.
    List,
    /// Count catalogued photos.
    Size,
    /// Show the record behind an archive path.
    Lookup { final_path: String },
    /// Print every record, ordered by archive path.
    Dump,
    /// Leave the shell.
    #[command(alias = "quit")]
    Exit,
}

/// Splits a shell line into words. Double or single quotes group words
/// containing spaces; there are no escapes.
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current: Option<String> = None;
    let mut quote: Option<char> = None;
    for c in line.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.get_or_insert_with(String::new).push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                current.get_or_insert_with(String::new);
            },
            (None, c) if c.is_whitespace() => words.extend(current.take()),
            (None, c) => current.get_or_insert_with(String::new).push(c),
        }
    }
    if let Some(q) = quote {
        return Err(format!("Unclosed {q}"));
    }
    words.extend(current);
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
        ShellLine::command().debug_assert();
    }

    #[rstest]
    #[case("", vec![])]
    #[case("  size  ", vec!["size"])]
    #[case(r#"match-path jpgs "IMG_.*\.jpg" '.* copy\.png'"#, vec!["match-path", "jpgs", r"IMG_.*\.jpg", r".* copy\.png"])]
    #[case(r#"write all "/tmp/my lists/all.txt""#, vec!["write", "all", "/tmp/my lists/all.txt"])]
    #[case(r#"show """#, vec!["show", ""])]
    fn test_split_words(#[case] line: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split_words(line).unwrap(), expected);
    }

    #[test]
    fn test_unclosed_quote() {
        assert_eq!(split_words(r#"show "all"#).unwrap_err(), "Unclosed \"");
    }

    #[test]
    fn test_shell_lines_parse() {
        let line = ShellLine::try_parse_from(["match-tag", "canon", "Model", "Canon .*", "EOS.*"]).unwrap();
        assert!(matches!(
            line.command,
            ShellCommand::MatchTag { ref name, ref tag, ref patterns } if name == "canon" && tag == "Model" && patterns.len() == 2
        ));
        assert!(matches!(ShellLine::try_parse_from(["quit"]).unwrap().command, ShellCommand::Exit));
        assert!(ShellLine::try_parse_from(["match-path", "empty"]).is_err());
        assert!(ShellLine::try_parse_from(["frobnicate"]).is_err());
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["shoebox", "-vv", "size"]).unwrap();
        assert_eq!(cli.log_level().as_deref(), Some("trace"));
        let cli = Cli::try_parse_from(["shoebox", "collect", "--archive", "/a", "/src"]).unwrap();
        assert_eq!(cli.log_level(), None);
        assert_eq!(cli.archive.as_deref(), Some(std::path::Path::new("/a")));
    }
}
