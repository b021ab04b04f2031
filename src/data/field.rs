use serde::{Deserialize, Serialize};

use crate::shared::*;

/// A crop planted when the field is set up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropPlacement {
    pub kind: CropKind,
    /// Grid cell (x, y).
    pub cell: (i32, i32),
}

/// 2×2 plot next to the origin, inside the NDVI broadcaster's reach.
pub fn default_field() -> Vec<CropPlacement> {
    vec![
        CropPlacement { kind: CropKind::Wheat, cell: (1, 1) },
        CropPlacement { kind: CropKind::Corn, cell: (2, 1) },
        CropPlacement { kind: CropKind::Tomato, cell: (1, 2) },
        CropPlacement { kind: CropKind::Carrot, cell: (2, 2) },
    ]
}
