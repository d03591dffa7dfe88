// SPDX-License-Identifier: MIT

use std::io::IsTerminal;
use std::process::{Child, Command, Stdio};

use clap::Args;
use termcolor::{ColorChoice, StandardStream, WriteColor};

use crate::utils::Result;

#[derive(Debug, Clone, Default, Args)]
pub struct Options {
    /// Page the output through `less`. Defaults to on for terminals.
    #[clap(long)]
    pub pager: Option<bool>,

    /// Color the output. Defaults to on for terminals.
    #[clap(long)]
    pub color: Option<bool>,
}

/// Where the tool's output goes: stdout, possibly colored, possibly behind a
/// pager. Dropping the value closes the stream and waits for the pager.
pub struct Output {
    stream: Option<Box<dyn WriteColor>>,
    pager: Option<Child>,
}

impl Output {
    pub fn open(options: &Options) -> Result<Output> {
        let to_terminal = std::io::stdout().is_terminal();
        let use_pager = options.pager.unwrap_or(to_terminal);
        let use_color = options.color.unwrap_or(to_terminal);

        if use_pager {
            if let Ok(mut pager) = Command::new("less")
                .arg("-FR")
                .stdin(Stdio::piped())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .spawn()
            {
                let stdin = pager.stdin.take().expect("pager stdin is piped");
                let stream: Box<dyn WriteColor> = if use_color {
                    Box::new(termcolor::Ansi::new(stdin))
                } else {
                    Box::new(termcolor::NoColor::new(stdin))
                };
                return Ok(Output {
                    stream: Some(stream),
                    pager: Some(pager),
                });
            }
            // No pager available; fall through to plain stdout.
        }

        let choice = if use_color {
            ColorChoice::Always
        } else {
            ColorChoice::Never
        };
        Ok(Output {
            stream: Some(Box::new(StandardStream::stdout(choice))),
            pager: None,
        })
    }

    pub fn writer(&mut self) -> &mut dyn WriteColor {
        self.stream.as_mut().expect("stream is open until drop")
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        // Drop the stream first so the pager sees EOF.
        self.stream = None;

        // Wait for the pager to exit, otherwise it ends up killed by the
        // shell and leaves the terminal in a bad state.
        if let Some(pager) = &mut self.pager {
            pager.wait().unwrap_or_default();
        }
    }
}
