use std::io::{BufRead, Write};

use mastermind_core::options::{extract_globals, GlobalOptions};
use mastermind_core::registry;

use crate::cmd::list::agent_lines;
use crate::dispatch::{run_agent, Context};

/// `--interactive`: ask for an agent and a description line until
/// `quit`, `exit` or end of input.
pub fn run(ctx: &Context, globals: &GlobalOptions, input: impl BufRead) -> anyhow::Result<()> {
    println!("mastermind interactive mode. Type 'quit' to leave.");
    print!("{}", agent_lines());
    let stdout = std::io::stdout();
    session(input, &mut stdout.lock(), |agent, line| {
        let tokens = std::iter::once(agent.to_string())
            .chain(line.split_whitespace().map(String::from));
        let (line_globals, remaining) = extract_globals(tokens, globals.clone())?;
        match remaining.split_first() {
            Some((name, rest)) => run_agent(ctx, &line_globals, name, rest),
            None => Ok(()),
        }
    })
}

fn is_exit(s: &str) -> bool {
    matches!(s, "quit" | "exit")
}

/// The prompt loop. Errors from `handle` are printed and the loop goes on.
fn session<R, W, F>(mut input: R, out: &mut W, mut handle: F) -> anyhow::Result<()>
where
    R: BufRead,
    W: Write,
    F: FnMut(&str, &str) -> anyhow::Result<()>,
{
    let mut read_line = |out: &mut W, prompt: &str| -> anyhow::Result<Option<String>> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    };

    loop {
        let Some(agent) = read_line(out, "agent> ")? else {
            break;
        };
        if agent.is_empty() {
            continue;
        }
        if is_exit(&agent) {
            break;
        }
        if registry::lookup(&agent).is_none() {
            eprintln!("✗ Unknown agent: {agent}");
            continue;
        }

        let Some(line) = read_line(out, "description> ")? else {
            break;
        };
        if is_exit(&line) {
            break;
        }
        if let Err(e) = handle(&agent, &line) {
            eprintln!("✗ {e:#}");
        }
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn drive(script: &str) -> Vec<(String, String)> {
        let mut seen = Vec::new();
        let mut out = Vec::new();
        session(Cursor::new(script.to_string()), &mut out, |agent, line| {
            seen.push((agent.to_string(), line.to_string()));
            if line.contains("boom") {
                anyhow::bail!("boom");
            }
            Ok(())
        })
        .unwrap();
        seen
    }

    #[test]
    fn runs_each_agent_and_stops_at_quit() {
        let seen = drive("generate\na todo app --language rust\nclean-code\n\nquit\ngenerate\nnever\n");
        assert_eq!(
            seen,
            vec![
                ("generate".to_string(), "a todo app --language rust".to_string()),
                ("clean-code".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn errors_do_not_end_the_loop() {
        let seen = drive("generate\nboom\ngenerate\nfine\n");
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].1, "fine");
    }

    #[test]
    fn unknown_agent_is_skipped_without_description() {
        let seen = drive("nope\ngenerate\nok\n");
        assert_eq!(seen, vec![("generate".to_string(), "ok".to_string())]);
    }

    #[test]
    fn eof_ends_the_session() {
        assert!(drive("").is_empty());
        assert!(drive("generate\n").is_empty());
    }
}
