//! Result sink - drains a walk and hands every result to a presenter

use std::io;

use crate::error::ScanError;
use crate::models::{ResultItem, ScanSummary};
use crate::walker::ResultStream;

/// Renders results; all human-facing formatting lives behind this trait
pub trait Presenter {
    /// Render one result
    fn present(&mut self, item: &ResultItem) -> io::Result<()>;

    /// Called once after the stream has closed
    fn finish(&mut self, _summary: &ScanSummary) -> io::Result<()> {
        Ok(())
    }
}

/// Collects results in memory
impl Presenter for Vec<ResultItem> {
    fn present(&mut self, item: &ResultItem) -> io::Result<()> {
        self.push(item.clone());
        Ok(())
    }
}

/// Drain `stream` into `presenter` until the walk has finished
///
/// The stream ends when the channel closes, not on any particular value. If
/// the presenter fails, the stream is dropped so blocked workers stop, and
/// the error is returned.
pub fn drain<P: Presenter + ?Sized>(
    mut stream: ResultStream,
    presenter: &mut P,
) -> Result<ScanSummary, ScanError> {
    while let Some(item) = stream.next() {
        if let Err(err) = presenter.present(&item) {
            if let Err(join_err) = stream.finish() {
                log::error!("walk did not shut down cleanly: {}", join_err);
            }
            return Err(ScanError::from(err).with_path(item.file_name));
        }
    }

    let summary = stream.finish()?;
    presenter.finish(&summary)?;
    Ok(summary)
}
