// Phase 3: リカバリポイント（圧縮区間の失敗時にシンク位置を戻す）

use std::io::{Seek, SeekFrom};

use tracing::{debug, warn};

/// Scoped recovery point on a seekable sink.
///
/// 作成時のシンク位置を記録する。[`Recovery::commit`] を呼ばずにガードが
/// 破棄されるとその位置までシークし直すので、エラーでもパニックでも論理的な
/// カーソルは元に戻る。開始位置より後に書かれたバイトは消さない。
pub struct Recovery<'a, S: Seek> {
    sink: &'a mut S,
    start_position: u64,
    committed: bool,
}

impl<'a, S: Seek> Recovery<'a, S> {
    pub fn establish(sink: &'a mut S) -> crate::error::Result<Self> {
        let start_position = sink.stream_position()?;
        Ok(Self {
            sink,
            start_position,
            committed: false,
        })
    }

    pub fn start_position(&self) -> u64 {
        self.start_position
    }

    pub fn sink(&mut self) -> &mut S {
        &mut *self.sink
    }

    /// リカバリポイント以降に書いた内容を確定する。
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl<S: Seek> Drop for Recovery<'_, S> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match self.sink.seek(SeekFrom::Start(self.start_position)) {
            Ok(_) => debug!(position = self.start_position, "sink rewound"),
            Err(e) => warn!(
                position = self.start_position,
                error = %e,
                "failed to rewind sink after encode error"
            ),
        }
    }
}

/// Run `work` against `sink` inside a recovery point.
///
/// On `Ok` the output is kept. On `Err` everything `work` owned has already
/// been dropped when the error reaches this frame; the sink is then rewound
/// and the error returned unchanged. There is no retry.
pub fn run_protected<S, T, F>(sink: &mut S, work: F) -> crate::error::Result<T>
where
    S: Seek,
    F: FnOnce(&mut S) -> crate::error::Result<T>,
{
    let mut recovery = Recovery::establish(sink)?;
    match work(recovery.sink()) {
        Ok(value) => {
            recovery.commit();
            Ok(value)
        }
        Err(e) => {
            warn!(
                start_position = recovery.start_position(),
                error = %e,
                "encode failed, giving up"
            );
            drop(recovery);
            Err(e)
        }
    }
}
