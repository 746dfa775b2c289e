//! Read-eval-print loop

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crypto_agent::CryptoAgent;

/// What a line of input asks for
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Quit,
    Reset,
    Skip,
    Ask(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Self::Skip
        } else if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            Self::Quit
        } else if line.eq_ignore_ascii_case("/reset") {
            Self::Reset
        } else {
            Self::Ask(line)
        }
    }
}

pub fn print_banner(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Crypto Agent initialized. Type 'quit' to exit, '/reset' to start over.")?;
    writeln!(out, "Example commands:")?;
    writeln!(out, "- What's the current Bitcoin price?")?;
    writeln!(out, "- ¿Cuál es el precio del Bitcoin?")?;
    writeln!(out, "- Show me crypto prices")?;
    out.flush()
}

/// Run until `quit`/`exit`, end of input, or Ctrl-C
pub async fn run<R, W>(agent: &mut CryptoAgent, input: R, out: &mut W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "\nYou: ")?;
        out.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                writeln!(out, "\nExiting...")?;
                break;
            }
        };
        let Some(line) = line else {
            writeln!(out)?;
            break;
        };

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Skip => {}
            Command::Reset => {
                agent.clear_context();
                writeln!(out, "\nConversation cleared.")?;
            }
            Command::Ask(text) => {
                let reply = tokio::select! {
                    reply = agent.process_message(text) => reply,
                    _ = tokio::signal::ctrl_c() => {
                        writeln!(out, "\nExiting...")?;
                        break;
                    }
                };
                writeln!(out, "\nAgent: {reply}")?;
            }
        }
    }

    Ok(())
}
