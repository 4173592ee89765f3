use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::epub::archive::{ArchiveAccessor, load_package};
use crate::epub::container::{CONTAINER_PATH, strip_bom};
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::Opf;

const EPUB_MIMETYPE: &str = "application/epub+zip";

/// 表示一个已打开的EPUB文件
pub struct Epub {
    archive: ZipArchive<File>,
    path: PathBuf,
    file_size: u64,
    package_path: String,
    package: Opf,
}

impl Epub {
    /// 打开EPUB文件并解析其OPF包文件
    ///
    /// 检查步骤：
    /// 1. 路径存在、不是目录、扩展名为 `.epub`
    /// 2. 如果存在mimetype条目，其内容必须为 `application/epub+zip`
    /// 3. `META-INF/container.xml` 至少包含一个rootfile，且OPF可以解析
    ///
    /// # 参数
    /// * `path` - EPUB文件路径
    ///
    /// # 返回值
    /// * `Result<Epub, EpubError>` - 已解析包文件的EPUB；任一检查失败时返回对应的错误
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Epub> {
        let path = path.as_ref();
        validate_path(path)?;

        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        let mut archive = ZipArchive::new(file)?;

        validate_mimetype(&mut archive)?;

        if archive.index_for_name(CONTAINER_PATH).is_none() {
            return Err(EpubError::InvalidEpub(format!("缺少 {}", CONTAINER_PATH)));
        }

        let (package_path, package) = load_package(|entry| read_entry(&mut archive, entry))?;
        debug!(path = %path.display(), package = %package_path, "EPUB打开成功");

        Ok(Epub {
            archive,
            path: path.to_path_buf(),
            file_size,
            package_path,
            package,
        })
    }

    /// EPUB文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArchiveAccessor for Epub {
    fn package_path(&self) -> &str {
        &self.package_path
    }

    fn package(&self) -> &Opf {
        &self.package
    }

    fn contains(&self, path: &str) -> bool {
        self.archive.index_for_name(path).is_some()
    }

    fn read_text(&mut self, path: &str) -> Result<String> {
        read_entry(&mut self.archive, path)
    }

    fn entry_names(&self) -> Vec<String> {
        self.archive.file_names().map(String::from).collect()
    }

    fn file_size(&self) -> Option<u64> {
        Some(self.file_size)
    }
}

fn validate_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(EpubError::NotFound(path.display().to_string()));
    }
    if path.is_dir() {
        return Err(EpubError::InvalidEpub(format!("路径是目录: {}", path.display())));
    }

    let is_epub = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"));
    if !is_epub {
        return Err(EpubError::InvalidEpub(format!("文件扩展名不是.epub: {}", path.display())));
    }

    Ok(())
}

/// 验证mimetype条目
///
/// 条目缺失只记录警告，内容不符时返回错误。
fn validate_mimetype(archive: &mut ZipArchive<File>) -> Result<()> {
    let mut file = match archive.by_name("mimetype") {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            warn!("EPUB缺少mimetype条目");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut content = String::new();
    file.read_to_string(&mut content)?;

    let content = content.trim();
    if content != EPUB_MIMETYPE {
        return Err(EpubError::InvalidMimetype {
            expected: EPUB_MIMETYPE.to_string(),
            found: content.to_string(),
        });
    }

    Ok(())
}

/// 读取条目文本，非UTF-8字节按有损方式解码
///
/// 找不到原始名称时再尝试百分号解码后的名称。
fn read_entry(archive: &mut ZipArchive<File>, path: &str) -> Result<String> {
    let name = if archive.index_for_name(path).is_some() {
        path.to_string()
    } else {
        let decoded = percent_encoding::percent_decode_str(path).decode_utf8_lossy().into_owned();
        if archive.index_for_name(&decoded).is_none() {
            return Err(EpubError::MissingEntry(path.to_string()));
        }
        decoded
    };

    let mut file = archive.by_name(&name)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content = String::from_utf8_lossy(&bytes);
    Ok(strip_bom(&content).to_string())
}
