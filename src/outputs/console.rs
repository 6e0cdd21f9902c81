//! Terminal presentation of the model's reply.

use std::io::{self, Write};

const HEADER: &str = "--- LLM Response ---";
const FOOTER: &str = "-----------------------";

/// Frame `reply` between the fixed header and separator lines.
pub fn render_reply(reply: &str) -> String {
    format!("\n{HEADER}\n\n{reply}\n\n{FOOTER}\n")
}

pub fn display_reply<W: Write>(out: &mut W, reply: &str) -> io::Result<()> {
    writeln!(out, "{}", render_reply(reply))
}
