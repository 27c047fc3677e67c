use crate::domain::model::OutputRegion;
use crate::domain::ports::Presenter;
use crate::utils::error::Result;
use std::io::Write;

/// Renders the display regions as framed text blocks on a writer.
#[derive(Debug)]
pub struct TerminalView<W: Write> {
    out: W,
    output_cursor: usize,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            output_cursor: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn block(&mut self, title: &str, text: &str) -> Result<()> {
        writeln!(self.out, "── {} ──", title)?;
        self.out.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            writeln!(self.out)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Presenter for TerminalView<W> {
    fn show_registers(&mut self, text: &str) -> Result<()> {
        self.block("registers", text)
    }

    fn show_memory(&mut self, text: &str) -> Result<()> {
        self.block("memory", text)
    }

    fn sync_output(&mut self, region: &OutputRegion) -> Result<()> {
        // a shorter region means a fresh log, start over
        if region.len() < self.output_cursor {
            self.output_cursor = 0;
        }
        let fresh = region.since(self.output_cursor);
        if !fresh.is_empty() {
            self.out.write_all(fresh.as_bytes())?;
            self.out.flush()?;
        }
        self.output_cursor = region.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_are_framed() {
        let mut view = TerminalView::new(Vec::new());
        view.show_registers("R0  (r0) = 00000000").unwrap();
        view.show_memory("[0x00400000] 0x8fa40000  lw $4, 0($29)\n").unwrap();

        let text = String::from_utf8(view.into_inner()).unwrap();
        assert_eq!(
            text,
            "── registers ──\nR0  (r0) = 00000000\n── memory ──\n[0x00400000] 0x8fa40000  lw $4, 0($29)\n"
        );
    }

    #[test]
    fn test_sync_output_writes_only_new_text() {
        let mut region = OutputRegion::new();
        let mut view = TerminalView::new(Vec::new());

        region.append("1");
        view.sync_output(&region).unwrap();
        view.sync_output(&region).unwrap();
        region.append("1");
        region.append("2");
        view.sync_output(&region).unwrap();

        let text = String::from_utf8(view.into_inner()).unwrap();
        assert_eq!(text, "1\n1\n2\n");
    }
}
