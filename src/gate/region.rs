//! Memory-mapped region holding the control block
//!
//! 存放控制块的内存映射区域

use super::error::{Error, Result};
use super::layout::ControlBlock;
use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::path::Path;
use std::ptr::NonNull;

/// A mapping of one shared control block
///
/// 一个共享控制块的映射
///
/// File-backed regions are `MAP_SHARED`, so every process that maps the same path
/// sees the same bytes. Anonymous regions are shared between the threads of one
/// process only.
///
/// 基于文件的区域使用 `MAP_SHARED`，映射同一路径的所有进程看到相同的字节。
/// 匿名区域只在同一进程的线程之间共享。
///
/// # Safety Notes
///
/// The block pointer is taken once from the mapping with write provenance. It stays
/// valid as long as `_mmap` is alive; moving the `MmapMut` does not move the mapping.
/// All mutation goes through atomics, `ShmMutex` or the dual-lock stats guard.
///
/// # 安全性说明
///
/// 控制块指针在映射时以可写来源获取一次。只要 `_mmap` 存活它就有效；移动 `MmapMut`
/// 不会移动映射本身。所有修改都经由原子量、`ShmMutex` 或双锁统计守卫进行。
pub(crate) struct Region {
    block: NonNull<ControlBlock>,
    _mmap: MmapMut,
}

// Safety: ControlBlock is Sync and the mapping is never remapped or resized
// Safety: ControlBlock 是 Sync 的，且映射不会被重新映射或调整大小
unsafe impl Send for Region {}
unsafe impl Sync for Region {}

impl Region {
    /// Create a new backing file exclusively and initialize the block in it
    ///
    /// 独占地创建新的后备文件并在其中初始化控制块
    ///
    /// # Errors
    /// - Returns `Io(AlreadyExists)` if the path already exists
    /// - Returns corresponding I/O errors if file creation or memory mapping fails
    ///
    /// # Errors
    /// - 如果路径已存在，返回 `Io(AlreadyExists)`
    /// - 如果无法创建文件或映射内存，返回相应的 I/O 错误
    pub(crate) fn create(path: impl AsRef<Path>, max_admitted: u32) -> Result<Self> {
        let path = path.as_ref();

        // Exclusive creation, zero-filled by set_len
        // 独占创建，由 set_len 填充零
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        file.set_len(ControlBlock::SIZE as u64)?;

        let mmap = unsafe { MmapOptions::new().len(ControlBlock::SIZE).map_mut(&file)? };
        Ok(Self::initialize(mmap, max_admitted))
    }

    /// Map an existing backing file and validate its header
    ///
    /// 映射已存在的后备文件并校验其头部
    pub(crate) fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)?;

        let required = ControlBlock::SIZE as u64;
        match file.metadata()?.len() {
            0 => return Err(Error::EmptyRegion),
            len if len < required => return Err(Error::RegionTooSmall { len, required }),
            _ => {}
        }

        let mut mmap = unsafe { MmapOptions::new().len(ControlBlock::SIZE).map_mut(&file)? };
        let block = Self::block_ptr(&mut mmap);

        // Safety: the mapping is at least SIZE bytes and page-aligned; every bit
        // pattern of the header fields is a valid value.
        // Safety: 映射至少有 SIZE 字节且按页对齐；头部字段的任意位模式都是合法值。
        let region = Self { block, _mmap: mmap };
        region.block().validate().map_err(|what| Error::LayoutMismatch { what })?;
        Ok(region)
    }

    /// Create a process-private region for threads or tasks
    ///
    /// 为线程或任务创建进程内私有区域
    pub(crate) fn anonymous(max_admitted: u32) -> Result<Self> {
        let mmap = MmapOptions::new().len(ControlBlock::SIZE).map_anon()?;
        Ok(Self::initialize(mmap, max_admitted))
    }

    fn initialize(mut mmap: MmapMut, max_admitted: u32) -> Self {
        let block = Self::block_ptr(&mut mmap);
        // Safety: the mapping is fresh, zero-filled and exactly SIZE bytes long
        // Safety: 映射是新建的、已清零，且长度恰好为 SIZE 字节
        unsafe { ControlBlock::init_in_place(block.as_ptr(), max_admitted) };
        Self { block, _mmap: mmap }
    }

    #[inline]
    fn block_ptr(mmap: &mut MmapMut) -> NonNull<ControlBlock> {
        debug_assert_eq!(mmap.as_ptr() as usize % std::mem::align_of::<ControlBlock>(), 0);
        // Safety: a successful mapping never starts at null
        // Safety: 成功的映射起始地址不会为空
        unsafe { NonNull::new_unchecked(mmap.as_mut_ptr().cast::<ControlBlock>()) }
    }

    /// Shared view of the control block
    ///
    /// 控制块的共享视图
    #[inline]
    pub(crate) fn block(&self) -> &ControlBlock {
        // Safety: see the type-level safety notes
        // Safety: 参见类型级别的安全性说明
        unsafe { self.block.as_ref() }
    }
}

/// Implement Debug for Region
///
/// 为 Region 实现 Debug
impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("size", &ControlBlock::SIZE)
            .field("mmap", &"MmapMut")
            .finish()
    }
}
