// Typed subset of the Slides API `batchUpdate` request vocabulary.
// Each variant serializes to `{ "<camelCaseName>": { ...fields } }`.
// See: https://developers.google.com/slides/api/reference/rest/v1/presentations/request

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    DeleteObject {
        object_id: String,
    },
    DuplicateObject {
        object_id: String,
    },
    DeleteText {
        object_id: String,
        text_range: Range,
    },
    InsertText {
        object_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        cell_location: Option<TableCellLocation>,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        insertion_index: Option<u32>,
    },
    CreateTable {
        object_id: String,
        element_properties: PageElementProperties,
        rows: usize,
        columns: usize,
    },
    UpdateTextStyle {
        object_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        cell_location: Option<TableCellLocation>,
        style: TextStyle,
        text_range: Range,
        fields: String,
    },
    UpdateTableCellProperties {
        object_id: String,
        table_range: TableRange,
        table_cell_properties: TableCellProperties,
        fields: String,
    },
    CreateParagraphBullets {
        object_id: String,
        text_range: Range,
        bullet_preset: String,
    },
    CreateShape {
        object_id: String,
        shape_type: String,
        element_properties: PageElementProperties,
    },
    UpdateShapeProperties {
        object_id: String,
        shape_properties: ShapeProperties,
        fields: String,
    },
}

impl Request {
    /// The object a request targets; used for logging and assertions.
    pub fn object_id(&self) -> &str {
        match self {
            Request::DeleteObject { object_id }
            | Request::DuplicateObject { object_id }
            | Request::DeleteText { object_id, .. }
            | Request::InsertText { object_id, .. }
            | Request::CreateTable { object_id, .. }
            | Request::UpdateTextStyle { object_id, .. }
            | Request::UpdateTableCellProperties { object_id, .. }
            | Request::CreateParagraphBullets { object_id, .. }
            | Request::CreateShape { object_id, .. }
            | Request::UpdateShapeProperties { object_id, .. } => object_id,
        }
    }

    pub fn delete_object(object_id: impl Into<String>) -> Self {
        Request::DeleteObject {
            object_id: object_id.into(),
        }
    }

    pub fn duplicate_object(object_id: impl Into<String>) -> Self {
        Request::DuplicateObject {
            object_id: object_id.into(),
        }
    }

    pub fn delete_all_text(object_id: impl Into<String>) -> Self {
        Request::DeleteText {
            object_id: object_id.into(),
            text_range: Range::all(),
        }
    }

    pub fn insert_text(object_id: impl Into<String>, text: impl Into<String>) -> Self {
        Request::InsertText {
            object_id: object_id.into(),
            cell_location: None,
            text: text.into(),
            insertion_index: None,
        }
    }

    pub fn insert_text_at_start(object_id: impl Into<String>, text: impl Into<String>) -> Self {
        Request::InsertText {
            object_id: object_id.into(),
            cell_location: None,
            text: text.into(),
            insertion_index: Some(0),
        }
    }

    pub fn insert_cell_text(
        table_id: impl Into<String>,
        location: TableCellLocation,
        text: impl Into<String>,
    ) -> Self {
        Request::InsertText {
            object_id: table_id.into(),
            cell_location: Some(location),
            text: text.into(),
            insertion_index: Some(0),
        }
    }

    pub fn bold_cell(table_id: impl Into<String>, location: TableCellLocation) -> Self {
        Request::UpdateTextStyle {
            object_id: table_id.into(),
            cell_location: Some(location),
            style: TextStyle {
                bold: Some(true),
                font_size: None,
            },
            text_range: Range::all(),
            fields: "bold".to_string(),
        }
    }

    pub fn shade_cell(table_id: impl Into<String>, location: TableCellLocation) -> Self {
        Request::UpdateTableCellProperties {
            object_id: table_id.into(),
            table_range: TableRange {
                location,
                row_span: 1,
                column_span: 1,
            },
            table_cell_properties: TableCellProperties::solid_fill(RgbColor::light_gray()),
            fields: "tableCellBackgroundFill.solidFill.color".to_string(),
        }
    }

    pub fn bullet_list(object_id: impl Into<String>) -> Self {
        Request::CreateParagraphBullets {
            object_id: object_id.into(),
            text_range: Range::all(),
            bullet_preset: "BULLET_DISC_CIRCLE_SQUARE".to_string(),
        }
    }

    pub fn font_size(object_id: impl Into<String>, points: f64) -> Self {
        Request::UpdateTextStyle {
            object_id: object_id.into(),
            cell_location: None,
            style: TextStyle {
                bold: None,
                font_size: Some(Dimension::pt(points)),
            },
            text_range: Range::all(),
            fields: "fontSize".to_string(),
        }
    }

    pub fn create_table(
        table_id: impl Into<String>,
        page_id: impl Into<String>,
        frame: Frame,
        rows: usize,
        columns: usize,
    ) -> Self {
        Request::CreateTable {
            object_id: table_id.into(),
            element_properties: frame.on_page(page_id),
            rows,
            columns,
        }
    }

    pub fn create_text_box(
        shape_id: impl Into<String>,
        page_id: impl Into<String>,
        frame: Frame,
    ) -> Self {
        Request::CreateShape {
            object_id: shape_id.into(),
            shape_type: "TEXT_BOX".to_string(),
            element_properties: frame.on_page(page_id),
        }
    }

    pub fn mark_as_body_placeholder(shape_id: impl Into<String>) -> Self {
        Request::UpdateShapeProperties {
            object_id: shape_id.into(),
            shape_properties: ShapeProperties {
                placeholder: Placeholder {
                    kind: "BODY".to_string(),
                },
            },
            fields: "placeholder.type".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Range {
    #[serde(rename = "type")]
    pub kind: String,
}

impl Range {
    pub fn all() -> Self {
        Self {
            kind: "ALL".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellLocation {
    pub row_index: usize,
    pub column_index: usize,
}

impl TableCellLocation {
    pub fn new(row_index: usize, column_index: usize) -> Self {
        Self {
            row_index,
            column_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRange {
    pub location: TableCellLocation,
    pub row_span: usize,
    pub column_span: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Dimension>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dimension {
    pub magnitude: f64,
    pub unit: &'static str,
}

impl Dimension {
    pub fn pt(magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: "PT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: Dimension,
    pub height: Dimension,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffineTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pub unit: &'static str,
}

impl AffineTransform {
    pub fn translate_pt(x: f64, y: f64) -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            translate_x: x,
            translate_y: y,
            unit: "PT",
        }
    }
}

/// Position and size of a new element, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    fn on_page(self, page_id: impl Into<String>) -> PageElementProperties {
        PageElementProperties {
            page_object_id: page_id.into(),
            size: Size {
                width: Dimension::pt(self.width),
                height: Dimension::pt(self.height),
            },
            transform: AffineTransform::translate_pt(self.x, self.y),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElementProperties {
    pub page_object_id: String,
    pub size: Size,
    pub transform: AffineTransform,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellProperties {
    pub table_cell_background_fill: BackgroundFill,
}

impl TableCellProperties {
    fn solid_fill(rgb_color: RgbColor) -> Self {
        Self {
            table_cell_background_fill: BackgroundFill {
                solid_fill: SolidFill {
                    color: OpaqueColor { rgb_color },
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundFill {
    pub solid_fill: SolidFill,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolidFill {
    pub color: OpaqueColor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpaqueColor {
    pub rgb_color: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RgbColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl RgbColor {
    pub fn light_gray() -> Self {
        Self {
            red: 0.9,
            green: 0.9,
            blue: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeProperties {
    pub placeholder: Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placeholder {
    #[serde(rename = "type")]
    pub kind: String,
}
