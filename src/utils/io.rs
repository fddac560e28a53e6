//! Line-oriented input with transparent gzip decoding, and staged output that
//! only appears at its final path once it has been written completely.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use noodles::bgzf;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Open a text stream, decompressing gzip/BGZF input detected by its magic bytes
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub fn open_input(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let mut reader = BufReader::new(File::open(path)?);
    let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);

    if is_gzip {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// Reads lines without their terminators, counting them as it goes.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
    line_number: u64,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            line_number: 0,
        }
    }

    /// Next `(1-based line number, line)` pair, or `None` at end of input
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the underlying reader fails.
    pub fn next_line(&mut self) -> io::Result<Option<(u64, Cow<'_, str>)>> {
        self.buf.clear();
        if self.inner.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }

        Ok(Some((self.line_number, String::from_utf8_lossy(&self.buf))))
    }
}

/// Compression applied to an output file, chosen from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputCompression {
    Plain,
    /// Blocked gzip, readable by any gzip decoder and indexable by tabix
    Bgzf,
}

impl OutputCompression {
    #[must_use]
    #[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
    pub fn from_path(path: &Path) -> Self {
        let path_str = path.to_string_lossy().to_lowercase();
        if path_str.ends_with(".gz") || path_str.ends_with(".bgz") {
            OutputCompression::Bgzf
        } else {
            OutputCompression::Plain
        }
    }
}

pub enum OutputWriter {
    Plain(BufWriter<File>),
    Bgzf(bgzf::Writer<BufWriter<File>>),
}

impl OutputWriter {
    /// Flush all buffered (and compressed) bytes to the file
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the final flush fails.
    pub fn finish(self) -> io::Result<File> {
        let buffered = match self {
            OutputWriter::Plain(writer) => writer,
            OutputWriter::Bgzf(writer) => writer.finish()?,
        };
        buffered.into_inner().map_err(io::IntoInnerError::into_error)
    }
}

impl Write for OutputWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputWriter::Plain(w) => w.write(buf),
            OutputWriter::Bgzf(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputWriter::Plain(w) => w.flush(),
            OutputWriter::Bgzf(w) => w.flush(),
        }
    }
}

/// An output file written to a temporary sibling path and renamed into place
/// by [`StagedOutput::publish`].
///
/// Dropping a `StagedOutput` without publishing deletes the temporary file, so
/// a failed run never leaves a truncated file at the target path.
pub struct StagedOutput {
    target: PathBuf,
    temp: NamedTempFile,
}

impl StagedOutput {
    /// Create the temporary file next to `target` so the final rename stays on one filesystem
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the temporary file cannot be created.
    pub fn create(target: &Path) -> io::Result<Self> {
        let temp = tempfile::Builder::new()
            .prefix(".vcf-fix-")
            .suffix(".partial")
            .tempfile_in(parent_dir(target))?;

        Ok(Self {
            target: target.to_path_buf(),
            temp,
        })
    }

    /// Writer that compresses according to the target's extension
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the temporary file handle cannot be cloned.
    pub fn writer(&self) -> io::Result<OutputWriter> {
        let file = BufWriter::new(self.temp.as_file().try_clone()?);
        Ok(match OutputCompression::from_path(&self.target) {
            OutputCompression::Plain => OutputWriter::Plain(file),
            OutputCompression::Bgzf => OutputWriter::Bgzf(bgzf::Writer::new(file)),
        })
    }

    /// Unbuffered, uncompressed handle for verbatim copies
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the temporary file handle cannot be cloned.
    pub fn raw_file(&self) -> io::Result<File> {
        self.temp.as_file().try_clone()
    }

    /// Sync and atomically move the temporary file to the target path
    ///
    /// # Errors
    ///
    /// Returns an I/O error if syncing or renaming fails; the temporary file is
    /// removed in that case.
    pub fn publish(self) -> io::Result<()> {
        self.temp.as_file().sync_all()?;

        // NamedTempFile is created owner-only; give the result normal file permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(self.temp.path(), std::fs::Permissions::from_mode(0o644))?;
        }

        self.temp.persist(&self.target).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Directory a file lives in, `.` for bare file names
#[must_use]
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Which side of a verbatim copy failed
#[derive(Error, Debug)]
pub enum CopyError {
    #[error("{0}")]
    Read(io::Error),

    #[error("{0}")]
    Write(io::Error),
}

/// Copy `input` to `output` byte for byte, publishing atomically
///
/// The input is opened before anything is staged, so a missing input leaves
/// no temporary file behind.
///
/// # Errors
///
/// Returns `CopyError::Read` if the input cannot be opened or read, and
/// `CopyError::Write` if staging, writing, or publishing fails.
pub fn copy_verbatim(input: &Path, output: &Path) -> Result<u64, CopyError> {
    let mut source = File::open(input)
        .map(BufReader::new)
        .map_err(CopyError::Read)?;
    let staged = StagedOutput::create(output).map_err(CopyError::Write)?;
    let mut dest = staged.raw_file().map_err(CopyError::Write)?;

    let mut copied = 0u64;
    loop {
        let chunk = source.fill_buf().map_err(CopyError::Read)?;
        if chunk.is_empty() {
            break;
        }
        dest.write_all(chunk).map_err(CopyError::Write)?;
        let len = chunk.len();
        source.consume(len);
        copied += len as u64;
    }

    dest.flush().map_err(CopyError::Write)?;
    staged.publish().map_err(CopyError::Write)?;
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Read;
    use tempfile::tempdir;

    fn read_all(path: &Path) -> String {
        let mut text = String::new();
        open_input(path).unwrap().read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_open_plain_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.vcf");
        std::fs::write(&path, "##fileformat=VCFv4.2\n").unwrap();
        assert_eq!(read_all(&path), "##fileformat=VCFv4.2\n");
    }

    #[test]
    fn test_open_gzip_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.vcf.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"##fileformat=VCFv4.2\n").unwrap();
        encoder.finish().unwrap();

        assert_eq!(read_all(&path), "##fileformat=VCFv4.2\n");
    }

    #[test]
    fn test_open_empty_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.vcf");
        std::fs::write(&path, "").unwrap();
        assert_eq!(read_all(&path), "");
    }

    #[test]
    fn test_line_reader_strips_terminators() {
        let mut lines = LineReader::new("a\r\nb\nc".as_bytes());
        let mut seen = Vec::new();
        while let Some((n, line)) = lines.next_line().unwrap() {
            seen.push((n, line.into_owned()));
        }
        assert_eq!(
            seen,
            vec![
                (1, "a".to_string()),
                (2, "b".to_string()),
                (3, "c".to_string())
            ]
        );
    }

    #[test]
    fn test_line_reader_replaces_invalid_utf8() {
        let bytes: &[u8] = b"ok\xff\n";
        let mut lines = LineReader::new(bytes);
        let (_, line) = lines.next_line().unwrap().unwrap();
        assert_eq!(line, "ok\u{fffd}");
    }

    #[test]
    fn test_output_compression_from_path() {
        assert_eq!(
            OutputCompression::from_path(Path::new("out.vcf")),
            OutputCompression::Plain
        );
        assert_eq!(
            OutputCompression::from_path(Path::new("out.vcf.gz")),
            OutputCompression::Bgzf
        );
        assert_eq!(
            OutputCompression::from_path(Path::new("OUT.VCF.BGZ")),
            OutputCompression::Bgzf
        );
    }

    #[test]
    fn test_staged_output_publish() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.vcf");

        let staged = StagedOutput::create(&target).unwrap();
        let mut writer = staged.writer().unwrap();
        writer.write_all(b"line\n").unwrap();
        writer.finish().unwrap();
        assert!(!target.exists());

        staged.publish().unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "line\n");
    }

    #[test]
    fn test_staged_output_bgzf_roundtrip() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.vcf.gz");

        let staged = StagedOutput::create(&target).unwrap();
        let mut writer = staged.writer().unwrap();
        writer.write_all(b"##fileformat=VCFv4.2\n").unwrap();
        writer.finish().unwrap();
        staged.publish().unwrap();

        assert_eq!(read_all(&target), "##fileformat=VCFv4.2\n");
    }

    #[test]
    fn test_staged_output_writes_bgzf_blocks() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.vcf.bgz");

        let staged = StagedOutput::create(&target).unwrap();
        let mut writer = staged.writer().unwrap();
        writer.write_all(b"##fileformat=VCFv4.2\n").unwrap();
        writer.finish().unwrap();
        staged.publish().unwrap();

        let bytes = std::fs::read(&target).unwrap();
        // gzip magic, deflate, FEXTRA set, then a `BC` extra subfield of length 2
        assert_eq!(&bytes[..4], &[0x1f, 0x8b, 0x08, 0x04]);
        assert_eq!(&bytes[12..16], &[b'B', b'C', 0x02, 0x00]);
        // BGZF streams end with the fixed empty EOF block
        assert_eq!(&bytes[bytes.len() - 28..bytes.len() - 24], &[0x1f, 0x8b, 0x08, 0x04]);
    }

    #[test]
    fn test_staged_output_dropped_leaves_nothing() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.vcf");

        {
            let staged = StagedOutput::create(&target).unwrap();
            let mut writer = staged.writer().unwrap();
            writer.write_all(b"partial").unwrap();
        }

        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_copy_verbatim() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.vcf");
        let output = dir.path().join("out.vcf");
        let content = b"##fileformat=VCFv4.2\r\n1\t1\t.\tA\tC\t.\t.\t.\n";
        std::fs::write(&input, content).unwrap();

        let copied = copy_verbatim(&input, &output).unwrap();
        assert_eq!(copied, content.len() as u64);
        assert_eq!(std::fs::read(&output).unwrap(), content);
    }

    #[test]
    fn test_copy_verbatim_missing_input_is_read_error() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.vcf");

        let result = copy_verbatim(&dir.path().join("missing.vcf"), &output);
        assert!(matches!(result, Err(CopyError::Read(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(Path::new("out.vcf")), Path::new("."));
        assert_eq!(parent_dir(Path::new("/tmp/out.vcf")), Path::new("/tmp"));
    }
}
