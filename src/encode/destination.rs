// Phase 3: 出力バッファ: 圧縮器 -> 4096バイト単位 -> シンク
//
// 満杯のバッファは1回のwriteでシンクへ渡し、残りはfinish()で書き出す。
// 書き込み不足は致命的で、以後の書き込みはすべて拒否する。

use std::fmt;
use std::io::{self, ErrorKind, Write};

/// エンコード中に使う出力バッファのサイズ。
pub const OUTPUT_BUFFER_SIZE: usize = 4096;

/// シンクが要求より少ないバイト数しか受け付けなかったときの `io::Error` の中身。
#[derive(Debug, Clone)]
pub struct ShortWrite {
    pub requested: usize,
    pub written: usize,
    pub cause: Option<String>,
}

impl fmt::Display for ShortWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sink accepted {} of {} bytes",
            self.written, self.requested
        )?;
        if let Some(cause) = &self.cause {
            write!(f, " ({cause})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ShortWrite {}

/// [`Destination`] が返したエラーから [`ShortWrite`] を取り出す。
pub fn short_write(err: &io::Error) -> Option<&ShortWrite> {
    err.get_ref().and_then(|e| e.downcast_ref::<ShortWrite>())
}

/// 圧縮器の出力をまとめて `sink` に書き込むアダプタ。
///
/// 1回のエンコード呼び出しの間だけ存在する。シンクは借用するだけで、
/// close も flush もしない。バッファの中身は [`Destination::flush_full_buffer`]
/// と [`Destination::finish`] を通してのみシンクに届く。
pub struct Destination<'a, S: Write> {
    sink: &'a mut S,
    buffer: [u8; OUTPUT_BUFFER_SIZE],
    free_in_buffer: usize,
    failure: Option<ShortWrite>,
}

impl<'a, S: Write> Destination<'a, S> {
    pub fn new(sink: &'a mut S) -> Self {
        let mut destination = Self {
            sink,
            buffer: [0; OUTPUT_BUFFER_SIZE],
            free_in_buffer: 0,
            failure: None,
        };
        destination.init();
        destination
    }

    /// カーソルをバッファ先頭に戻し、全容量を空きにする。
    pub fn init(&mut self) {
        self.free_in_buffer = OUTPUT_BUFFER_SIZE;
    }

    /// バッファに溜まっていて、まだシンクに書かれていないバイト数。
    pub fn pending(&self) -> usize {
        OUTPUT_BUFFER_SIZE - self.free_in_buffer
    }

    /// The short write that broke this destination, if any.
    ///
    /// Codecs may swallow or rewrap the `io::Error` we return, so the driver
    /// asks the destination directly.
    pub fn failure(&self) -> Option<&ShortWrite> {
        self.failure.as_ref()
    }

    /// バッファ全体をシンクへ書き込み、リセットする。
    pub fn flush_full_buffer(&mut self) -> io::Result<()> {
        self.write_to_sink(OUTPUT_BUFFER_SIZE)?;
        self.init();
        Ok(())
    }

    /// 残りのバイトを書き出す。圧縮器がすべての出力を終えた後に1回だけ呼ぶ。
    pub fn finish(mut self) -> io::Result<()> {
        let remain = self.pending();
        if remain > 0 {
            self.write_to_sink(remain)?;
        }
        self.init();
        Ok(())
    }

    fn write_to_sink(&mut self, len: usize) -> io::Result<()> {
        if self.failure.is_some() {
            return Err(poisoned_error(len));
        }

        let result = self.sink.write(&self.buffer[..len]);
        let (written, kind, cause) = match result {
            Ok(n) if n == len => return Ok(()),
            Ok(n) => (n, ErrorKind::WriteZero, None),
            Err(e) => (0, e.kind(), Some(e.to_string())),
        };

        let short = ShortWrite {
            requested: len,
            written,
            cause,
        };
        self.failure = Some(short.clone());
        Err(io::Error::new(kind, short))
    }
}

impl<S: Write> Write for Destination<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.failure.is_some() {
            return Err(poisoned_error(buf.len()));
        }
        if self.free_in_buffer == 0 {
            self.flush_full_buffer()?;
        }

        let n = buf.len().min(self.free_in_buffer);
        let start = self.pending();
        self.buffer[start..start + n].copy_from_slice(&buf[..n]);
        self.free_in_buffer -= n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        // 途中のバッファはfinish()でのみ書き出す
        Ok(())
    }
}

fn poisoned_error(requested: usize) -> io::Error {
    io::Error::new(
        ErrorKind::WriteZero,
        ShortWrite {
            requested,
            written: 0,
            cause: Some("destination failed earlier".to_string()),
        },
    )
}
