//! The numbered-command loop.
//!
//! Reads one command per line, prompts for any arguments on the following
//! lines, and prints results to the writer. A failed command never ends
//! the loop: API errors are printed, transport errors are logged.

use super::http::ApiClient;
use super::ClientError;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::error;

/// A menu choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    End,
    Users,
    Jobs,
    Upload,
    Download,
    Reset,
    Keywords,
    TranslatePdf,
    Unknown,
}

impl Command {
    /// Parse one input line; anything but a listed number is `Unknown`.
    pub fn parse(line: &str) -> Self {
        match line.trim().parse::<u32>() {
            Ok(0) => Command::End,
            Ok(1) => Command::Users,
            Ok(2) => Command::Jobs,
            Ok(3) => Command::Upload,
            Ok(4) => Command::Download,
            Ok(5) => Command::Reset,
            Ok(6) => Command::Keywords,
            Ok(7) => Command::TranslatePdf,
            _ => Command::Unknown,
        }
    }

    /// Name used in log lines.
    pub fn name(self) -> &'static str {
        match self {
            Command::End => "end",
            Command::Users => "users",
            Command::Jobs => "jobs",
            Command::Upload => "upload",
            Command::Download => "download",
            Command::Reset => "reset",
            Command::Keywords => "keywords",
            Command::TranslatePdf => "translate",
            Command::Unknown => "unknown",
        }
    }
}

const MENU: &str = "\n>> Enter a command:
   0 => end
   1 => users
   2 => jobs
   3 => upload
   4 => download
   5 => reset
   6 => keywords
   7 => translate pdf";

/// Run the menu until `0` or end of input.
pub async fn run_menu<R: BufRead, W: Write>(
    client: &ApiClient,
    input: &mut R,
    out: &mut W,
) -> io::Result<()> {
    loop {
        writeln!(out, "{MENU}")?;
        out.flush()?;
        let command = match read_line(input)? {
            Some(line) => Command::parse(&line),
            None => Command::End,
        };

        let result = match command {
            Command::End => break,
            Command::Unknown => {
                writeln!(out, "** Unknown command, try again...")?;
                continue;
            }
            Command::Users => users(client, out).await,
            Command::Jobs => jobs(client, out).await,
            Command::Upload => upload(client, input, out).await,
            Command::Download => download(client, input, out).await,
            Command::Reset => reset(client, out).await,
            Command::Keywords => keywords(client, out).await,
            Command::TranslatePdf => translate_pdf(client, input, out).await,
        };

        match result {
            Ok(()) => {}
            Err(StepError::Io(e)) => return Err(e),
            Err(StepError::Client(e)) => report(command, &e, out)?,
        }
    }

    writeln!(out)?;
    writeln!(out, "** done **")?;
    out.flush()
}

/// Failures of one command: either an I/O error on the console or an API
/// error to report and move past.
enum StepError {
    Io(io::Error),
    Client(ClientError),
}

impl From<io::Error> for StepError {
    fn from(e: io::Error) -> Self {
        StepError::Io(e)
    }
}

impl From<ClientError> for StepError {
    fn from(e: ClientError) -> Self {
        StepError::Client(e)
    }
}

type Step = Result<(), StepError>;

fn report<W: Write>(command: Command, e: &ClientError, out: &mut W) -> io::Result<()> {
    match e {
        ClientError::Status { .. } | ClientError::MissingFile(_) => writeln!(out, "{e}"),
        _ => {
            error!(
                "{}() failed: url: {}: {}",
                command.name(),
                e.url().unwrap_or("-"),
                e
            );
            Ok(())
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> io::Result<String> {
    writeln!(out, "{label}")?;
    out.flush()?;
    Ok(read_line(input)?.unwrap_or_default())
}

/// Ask for a PDF path; a missing file ends the command.
fn prompt_pdf<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<String, StepError> {
    let name = prompt(input, out, "Enter PDF filename>")?;
    if !Path::new(&name).is_file() {
        return Err(ClientError::MissingFile(name.into()).into());
    }
    Ok(name)
}

async fn users<W: Write>(client: &ApiClient, out: &mut W) -> Step {
    let users = client.users().await?;
    if users.is_empty() {
        writeln!(out, "no users...")?;
    }
    for user in users {
        writeln!(out, "{user}")?;
    }
    Ok(())
}

async fn jobs<W: Write>(client: &ApiClient, out: &mut W) -> Step {
    let jobs = client.jobs().await?;
    if jobs.is_empty() {
        writeln!(out, "no jobs...")?;
    }
    for job in jobs {
        writeln!(out, "{job}")?;
    }
    Ok(())
}

async fn upload<R: BufRead, W: Write>(client: &ApiClient, input: &mut R, out: &mut W) -> Step {
    let pdf = prompt_pdf(input, out)?;
    let userid = prompt(input, out, "Enter user id>")?;
    let jobid = client.upload(Path::new(&pdf), &userid).await?;
    writeln!(out, "PDF uploaded, job id = {}", display_value(&jobid))?;
    Ok(())
}

async fn download<R: BufRead, W: Write>(client: &ApiClient, input: &mut R, out: &mut W) -> Step {
    let jobid = prompt(input, out, "Enter job id>")?;
    let results = client.download(&jobid).await?;
    writeln!(out, "{results}")?;
    Ok(())
}

async fn reset<W: Write>(client: &ApiClient, out: &mut W) -> Step {
    let message = client.reset().await?;
    writeln!(out, "{}", display_value(&message))?;
    Ok(())
}

async fn keywords<W: Write>(client: &ApiClient, out: &mut W) -> Step {
    let keywords = client.keywords().await?;
    if keywords.is_empty() {
        writeln!(out, "no keywords...")?;
    }
    for keyword in keywords {
        writeln!(out, "{keyword}")?;
    }
    Ok(())
}

async fn translate_pdf<R: BufRead, W: Write>(
    client: &ApiClient,
    input: &mut R,
    out: &mut W,
) -> Step {
    let pdf = prompt_pdf(input, out)?;
    let language = prompt(input, out, "Enter language code (e.g., 'es' for Spanish)>")?;
    let translated = client.translate(Path::new(&pdf), &language).await?;
    writeln!(out, "Translated Text:\n")?;
    writeln!(
        out,
        "{}",
        translated.as_deref().unwrap_or("No translated text found.")
    )?;
    Ok(())
}

/// Strings print without quotes; everything else as JSON.
fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn offline_client() -> ApiClient {
        ApiClient::new("http://127.0.0.1:1/prod", 2).unwrap()
    }

    async fn run(script: &str) -> String {
        let client = offline_client();
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        run_menu(&client, &mut input, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn command_parsing() {
        assert_eq!(Command::parse("0"), Command::End);
        assert_eq!(Command::parse("1\n"), Command::Users);
        assert_eq!(Command::parse(" 7 "), Command::TranslatePdf);
        assert_eq!(Command::parse(""), Command::Unknown);
        assert_eq!(Command::parse("abc"), Command::Unknown);
        assert_eq!(Command::parse("8"), Command::Unknown);
        assert_eq!(Command::parse("-1"), Command::Unknown);
    }

    #[tokio::test]
    async fn unknown_commands_then_end() {
        let out = run("9\nfoo\n0\n").await;
        assert_eq!(out.matches("** Unknown command, try again...").count(), 2);
        assert!(out.contains("7 => translate pdf"));
        assert!(out.ends_with("\n** done **\n"));
    }

    #[tokio::test]
    async fn end_of_input_ends_the_loop() {
        let out = run("").await;
        assert!(out.contains("** done **"));
    }

    #[tokio::test]
    async fn missing_pdf_is_printed_and_loop_continues() {
        let out = run("7\n/nonexistent/doc.pdf\n3\n/nonexistent/other.pdf\n0\n").await;
        assert!(out.contains("PDF file '/nonexistent/doc.pdf' does not exist..."));
        assert!(out.contains("PDF file '/nonexistent/other.pdf' does not exist..."));
        assert!(!out.contains("Enter language code"));
        assert!(out.contains("** done **"));
    }

    #[tokio::test]
    async fn transport_errors_do_not_stop_the_menu() {
        let out = run("1\n2\n0\n").await;
        assert_eq!(out.matches(">> Enter a command:").count(), 3);
        assert!(out.contains("** done **"));
    }

    #[test]
    fn values_display_without_quotes() {
        assert_eq!(display_value(&serde_json::json!("reset")), "reset");
        assert_eq!(display_value(&serde_json::json!(42)), "42");
    }
}
