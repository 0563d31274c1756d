//! Line-oriented shell over [`Commands`].

use crate::cli::{ShellCommand, ShellLine, split_words};
use clap::Parser;
use shoebox_library::Commands;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const PROMPT: &str = "shoebox$ ";

/// What to do after a line.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Exit,
}

/// Runs one line against `commands`.
pub async fn execute(commands: &mut Commands, line: &str) -> Outcome {
    let words = match split_words(line) {
        Ok(words) if words.is_empty() => return Outcome::Continue(String::new()),
        Ok(words) => words,
        Err(message) => return Outcome::Continue(message),
    };
    let command = match ShellLine::try_parse_from(words) {
        Ok(line) => line.command,
        // Includes `help`, which clap reports as an "error" carrying the help text.
        Err(e) => return Outcome::Continue(e.render().to_string()),
    };
    let output = match command {
        ShellCommand::Collect { overwrite, roots } => commands.collect(overwrite, roots).await,
        ShellCommand::MoveFiles { list, output_dir } => commands.move_files(&list, &output_dir).await,
        ShellCommand::Delete { list } => commands.delete(&list).await,
        ShellCommand::MatchPath { name, patterns } => commands.match_path(&name, &patterns).await,
        ShellCommand::MatchTag { name, tag, patterns } => commands.match_tag(&name, &tag, &patterns).await,
        ShellCommand::Merge { a, b, name } => commands.merge(&a, &b, &name),
        ShellCommand::Intersect { a, b, name } => commands.intersect(&a, &b, &name),
        ShellCommand::Show { list } => commands.show(&list),
        ShellCommand::Write { list, file } => commands.write(&list, &file).await,
        ShellCommand::Drop { list } => commands.drop(&list),
        ShellCommand::List => commands.list(),
        ShellCommand::Size => commands.size().await,
        ShellCommand::Lookup { final_path } => commands.lookup(&final_path).await,
        ShellCommand::Dump => commands.dump().await,
        ShellCommand::Exit => return Outcome::Exit,
    };
    Outcome::Continue(output)
}

/// Reads lines from `input` until it ends or `exit` is typed, printing each
/// result to `output`.
pub async fn run<R, W>(commands: &mut Commands, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;
        let Some(line) = lines.next_line().await? else {
            writeln!(output)?;
            return Ok(());
        };
        match execute(commands, &line).await {
            Outcome::Continue(text) if text.is_empty() => {},
            Outcome::Continue(text) => writeln!(output, "{}", text.trim_end())?,
            Outcome::Exit => return Ok(()),
        }
    }
}
