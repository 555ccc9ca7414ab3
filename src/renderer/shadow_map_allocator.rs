use glam::UVec2;
use log::debug;

use crate::error::{PipelineError, Result};
use crate::settings::ShadowSettings;

/// Texel rectangle inside a shadow map page, `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShadowMapRect {
    pub min: UVec2,
    pub max: UVec2,
}

impl ShadowMapRect {
    pub fn new(min: UVec2, max: UVec2) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> UVec2 {
        self.max - self.min
    }

    pub fn width(&self) -> u32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> u32 {
        self.max.y - self.min.y
    }

    fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }
}

/// Region of a shadow map page handed to one light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowMapRegion {
    pub page_index: usize,
    pub rect: ShadowMapRect,
    /// Size of the whole page texture.
    pub texture_size: UVec2,
}

impl ShadowMapRegion {
    /// Cell `index` of the region divided into a `grid` of equal cells, row by row.
    pub fn split(&self, index: usize, grid: UVec2) -> ShadowMapRegion {
        let grid = grid.max(UVec2::ONE);
        let cell_size = self.rect.size() / grid;
        let cell = UVec2::new(index as u32 % grid.x, index as u32 / grid.x);
        let min = self.rect.min + cell_size * cell;
        ShadowMapRegion {
            rect: ShadowMapRect::new(min, min + cell_size),
            ..*self
        }
    }
}

/// Best-fit rectangle packer for one page. Every placement splits the chosen
/// free rectangle once, along its shorter leftover axis.
#[derive(Debug, Clone)]
struct AreaAllocator {
    free: Vec<ShadowMapRect>,
}

impl AreaAllocator {
    fn new(size: u32) -> Self {
        Self {
            free: vec![ShadowMapRect::new(UVec2::ZERO, UVec2::splat(size))],
        }
    }

    fn allocate(&mut self, size: UVec2) -> Option<ShadowMapRect> {
        let (best, _) = self
            .free
            .iter()
            .enumerate()
            .filter(|(_, rect)| rect.width() >= size.x && rect.height() >= size.y)
            .min_by_key(|(_, rect)| rect.area() - u64::from(size.x) * u64::from(size.y))?;

        let rect = self.free.swap_remove(best);
        let placed = ShadowMapRect::new(rect.min, rect.min + size);
        let leftover = rect.size() - size;

        // Split along the axis that keeps the larger leftover piece whole.
        let (right, bottom) = if leftover.x > leftover.y {
            (
                ShadowMapRect::new(UVec2::new(placed.max.x, rect.min.y), rect.max),
                ShadowMapRect::new(
                    UVec2::new(rect.min.x, placed.max.y),
                    UVec2::new(placed.max.x, rect.max.y),
                ),
            )
        } else {
            (
                ShadowMapRect::new(
                    UVec2::new(placed.max.x, rect.min.y),
                    UVec2::new(rect.max.x, placed.max.y),
                ),
                ShadowMapRect::new(UVec2::new(rect.min.x, placed.max.y), rect.max),
            )
        };
        self.free.extend([right, bottom].into_iter().filter(|r| r.area() > 0));
        Some(placed)
    }
}

/// Transient shadow map space, handed out per frame from a pool of square
/// pages.
#[derive(Debug)]
pub struct ShadowMapAllocator {
    page_size: u32,
    max_pages: usize,
    pages: Vec<AreaAllocator>,
}

impl ShadowMapAllocator {
    pub fn new(settings: &ShadowSettings) -> Self {
        Self {
            page_size: settings.page_size,
            max_pages: settings.max_pages,
            pages: Vec::new(),
        }
    }

    /// Frees every region. Pages stay allocated.
    pub fn reset(&mut self) {
        let page_size = self.page_size;
        for page in &mut self.pages {
            *page = AreaAllocator::new(page_size);
        }
    }

    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    /// Requests larger than a page are clamped to the page size.
    pub fn allocate(&mut self, size: UVec2) -> Result<ShadowMapRegion> {
        if self.page_size == 0 {
            return Err(PipelineError::ShadowMapUnavailable);
        }

        let clamped = size.min(UVec2::splat(self.page_size)).max(UVec2::ONE);
        let texture_size = UVec2::splat(self.page_size);

        for (page_index, page) in self.pages.iter_mut().enumerate() {
            if let Some(rect) = page.allocate(clamped) {
                return Ok(ShadowMapRegion {
                    page_index,
                    rect,
                    texture_size,
                });
            }
        }

        if self.pages.len() >= self.max_pages {
            return Err(PipelineError::ShadowMapExhausted {
                width: clamped.x,
                height: clamped.y,
                pages: self.pages.len(),
            });
        }

        debug!(
            "Adding shadow map page {} ({}x{})",
            self.pages.len(),
            self.page_size,
            self.page_size
        );
        let mut page = AreaAllocator::new(self.page_size);
        let rect = page.allocate(clamped).ok_or(PipelineError::ShadowMapExhausted {
            width: clamped.x,
            height: clamped.y,
            pages: self.pages.len(),
        })?;
        self.pages.push(page);
        Ok(ShadowMapRegion {
            page_index: self.pages.len() - 1,
            rect,
            texture_size,
        })
    }
}
