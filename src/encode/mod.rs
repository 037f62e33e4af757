// Phase 3: エンコーダブリッジ: Surface -> 圧縮器 -> シーク可能なシンク

pub mod destination;
pub mod jpeg;
pub mod normalize;
pub mod png;
pub mod recovery;

use std::cell::Cell;
use std::io::{self, Seek, Write};
use std::path::Path;
use std::rc::Rc;

use tracing::debug;

use crate::error::UpscaleError;
use crate::surface::{PixelFormat, Surface};
use destination::Destination;

/// Output container chosen from the destination file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    /// 拡張子（`.jpg`, `.jpeg`, `.png`、大文字小文字は区別しない）から形式を決める。
    pub fn from_path(path: &Path) -> crate::error::Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("jpg") | Some("jpeg") => Ok(OutputFormat::Jpeg),
            Some("png") => Ok(OutputFormat::Png),
            _ => Err(UpscaleError::config(format!(
                "cannot determine output format for '{}' (expected .png, .jpg or .jpeg)",
                path.display()
            ))),
        }
    }
}

/// Row-at-a-time compressor driven by [`encode_surface`].
pub(crate) trait ScanlineCompressor {
    /// ターゲット形式の1行（`width * bytes_per_pixel` バイト）を渡す。
    fn write_scanline(&mut self, row: &[u8]) -> crate::error::Result<()>;

    /// 画像の終わりを通知し、残りの出力を書き出す。
    fn finish(self) -> crate::error::Result<()>;
}

/// A compressed image format the encoder bridge can drive.
pub(crate) trait Codec {
    /// Format name used in log messages.
    const NAME: &'static str;
    /// Largest width or height the bitstream can express.
    const MAX_DIMENSION: u32;

    /// クランプ済みの圧縮パラメータ
    type Params: Copy + std::fmt::Debug;
    type Compressor<W: Write>: ScanlineCompressor;

    /// The single pixel layout the compressor accepts.
    fn target_layout() -> PixelFormat;

    /// Configure a compressor writing to `out`.
    fn start<W: Write>(
        out: W,
        width: u32,
        height: u32,
        params: Self::Params,
    ) -> crate::error::Result<Self::Compressor<W>>;

    /// Wrap a compressor-internal failure.
    fn encode_error(msg: String) -> UpscaleError;
}

/// Encode `surface` to `sink` with codec `C`.
///
/// 検証と正規化はリカバリポイントの前に行う。圧縮器の設定以降に失敗した
/// 場合、`sink` は呼び出し時の位置に戻される。変換コピーはどの経路でも解放される。
pub(crate) fn encode_surface<C, S>(
    sink: &mut S,
    surface: &Surface,
    params: C::Params,
) -> crate::error::Result<()>
where
    C: Codec,
    S: Write + Seek,
{
    validate_surface::<C>(surface)?;

    let target = C::target_layout();
    let ready = normalize::ensure_target_layout(surface, &target)?;

    recovery::run_protected(sink, |sink| {
        let mut destination = Destination::new(sink);
        let streamed = stream_rows::<C, _>(&mut destination, &ready, params);

        // 圧縮器がio::Errorを包み直しても、シンクの書き込み不足を優先して報告する
        if let Some(short) = destination.failure() {
            return Err(UpscaleError::sink_write(short.to_string()));
        }
        streamed?;

        destination
            .finish()
            .map_err(|e| io_failure(e, C::encode_error))
    })
}

/// Push every row of `surface` through a fresh compressor writing to `out`.
fn stream_rows<C: Codec, W: Write>(
    out: W,
    surface: &Surface,
    params: C::Params,
) -> crate::error::Result<()> {
    let (width, height) = (surface.width(), surface.height());
    debug!(codec = C::NAME, width, height, ?params, "starting compressor");

    let open = Rc::new(Cell::new(true));
    let gated = Gate {
        inner: out,
        open: Rc::clone(&open),
    };
    let mut compressor = C::start(gated, width, height, params)?;

    for y in 0..height {
        if let Err(e) = compressor.write_scanline(surface.row(y)) {
            // 破棄時に圧縮器が書く終端データは出力しない
            open.set(false);
            return Err(e);
        }
    }

    compressor.finish()
}

/// Output handed to the compressor. Once closed, every write fails and
/// nothing reaches the inner writer.
struct Gate<W> {
    inner: W,
    open: Rc<Cell<bool>>,
}

impl<W: Write> Write for Gate<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.open.get() {
            return Err(io::Error::other("compressor output closed after failure"));
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.open.get() {
            return Ok(());
        }
        self.inner.flush()
    }
}

fn validate_surface<C: Codec>(surface: &Surface) -> crate::error::Result<()> {
    let (width, height) = (surface.width(), surface.height());
    if width == 0 || height == 0 {
        return Err(UpscaleError::precondition(format!(
            "cannot encode an empty {width}x{height} surface as {}",
            C::NAME
        )));
    }
    if width > C::MAX_DIMENSION || height > C::MAX_DIMENSION {
        return Err(UpscaleError::precondition(format!(
            "{width}x{height} exceeds the {} limit of {} pixels per side",
            C::NAME,
            C::MAX_DIMENSION
        )));
    }
    Ok(())
}

/// 圧縮器の書き込み中に発生したI/Oエラーを変換する。
///
/// 出力先の書き込み不足は `SinkWriteError`、それ以外は `fallback` で
/// 圧縮器のエラーとして報告する。
pub(crate) fn io_failure(err: io::Error, fallback: fn(String) -> UpscaleError) -> UpscaleError {
    match destination::short_write(&err) {
        Some(short) => UpscaleError::sink_write(short.to_string()),
        None => fallback(err.to_string()),
    }
}
