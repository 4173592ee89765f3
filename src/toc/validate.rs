//! 目录质量校验

use crate::epub::ArchiveAccessor;
use crate::toc::error::ValidationRejection;
use crate::toc::item::{TocItem, count_items, flatten};

/// 校验规范化后的目录
///
/// 接受条件：条目数大于0且不超过 `max_items`，并且至少有一个条目的资源存在于归档中。
pub fn validate<A: ArchiveAccessor + ?Sized>(
    items: &[TocItem],
    archive: &A,
    max_items: usize,
) -> Result<(), ValidationRejection> {
    let count = count_items(items);
    if count == 0 {
        return Err(ValidationRejection::Empty);
    }
    if count > max_items {
        return Err(ValidationRejection::TooManyItems {
            count,
            limit: max_items,
        });
    }

    let resolvable = flatten(items).into_iter().any(|item| {
        let resource = item.resource();
        !resource.is_empty() && archive.contains(resource)
    });
    if !resolvable {
        return Err(ValidationRejection::NoResolvableHref);
    }

    Ok(())
}
