//! Yes/no confirmation prompts

use std::io::{self, BufRead, Write};

/// Ask `question` on stdout; `assume_yes` skips the prompt entirely
///
/// Anything but `y`/`Y` (including EOF or a read error) is a no.
pub fn confirm(question: &str, assume_yes: bool) -> bool {
    if assume_yes {
        return true;
    }
    let stdin = io::stdin();
    let stdout = io::stdout();
    confirm_with(&mut stdin.lock(), &mut stdout.lock(), question).unwrap_or(false)
}

fn confirm_with<R: BufRead, W: Write>(reader: &mut R, writer: &mut W, question: &str) -> io::Result<bool> {
    write!(writer, "{} (y/n): ", question)?;
    writer.flush()?;

    let mut answer = String::new();
    if reader.read_line(&mut answer)? == 0 {
        writeln!(writer)?;
        return Ok(false);
    }
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
