//! Binding YAML data to [`FieldValue`]s.
//!
//! Scalars bind by their YAML shape alone. Mappings are ambiguous (a
//! structure, a bitset, a sprite region, a grid or a text bundle look alike)
//! and are read according to the field's declared type.

use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value as Yaml};

use crate::container::TextBundle;
use crate::error::{RcdError, Result, ValueError};
use crate::sprite::SheetGrid;
use crate::types::{DataType, FieldValue, ImageRegion, StructType};

/// Key that marks a mapping as a sprite grid.
const LAYOUT_KEY: &str = "layout";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRegion {
    sheet: String,
    #[serde(default)]
    x: u32,
    #[serde(default)]
    y: u32,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    x_offset: i32,
    #[serde(default)]
    y_offset: i32,
    #[serde(default = "default_crop")]
    crop: bool,
}

fn default_crop() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGrid {
    sheet: String,
    #[serde(default)]
    cell_width: Option<u32>,
    #[serde(default)]
    cell_height: Option<u32>,
    #[serde(default)]
    x_offset: i32,
    #[serde(default)]
    y_offset: i32,
    layout: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// Bind a YAML value to a field of type `ty`.
pub fn bind(value: &Yaml, ty: &DataType, base_dir: &Path) -> Result<FieldValue> {
    match value {
        Yaml::Null => Ok(FieldValue::Block(None)),
        Yaml::Number(n) => n.as_i64().map(FieldValue::Number).ok_or_else(|| {
            ValueError::Parse {
                text: n.to_string(),
                type_name: ty.name(),
            }
            .into()
        }),
        Yaml::String(s) => Ok(FieldValue::Symbol(s.clone())),
        Yaml::Sequence(items) => match ty {
            DataType::List(list) => items
                .iter()
                .map(|item| bind(item, &list.element, base_dir))
                .collect::<Result<Vec<_>>>()
                .map(FieldValue::List),
            _ => Err(mismatch("a scalar or mapping", ty)),
        },
        Yaml::Mapping(map) => bind_mapping(map, ty, base_dir),
        Yaml::Tagged(tagged) => bind(&tagged.value, ty, base_dir),
        Yaml::Bool(_) => Err(mismatch("a number, symbol or mapping", ty)),
    }
}

fn bind_mapping(map: &Mapping, ty: &DataType, base_dir: &Path) -> Result<FieldValue> {
    match ty {
        DataType::BlockReference(_) | DataType::ImageData => {
            let raw: RawRegion = from_mapping(map, "sprite region")?;
            Ok(FieldValue::Image(ImageRegion {
                sheet: base_dir.join(raw.sheet),
                x: raw.x,
                y: raw.y,
                width: raw.width,
                height: raw.height,
                x_offset: raw.x_offset,
                y_offset: raw.y_offset,
                crop: raw.crop,
            }))
        }
        DataType::Text => bind_text(map),
        DataType::BitSet(_) => bind_bits(map, ty),
        DataType::List(_) => bind_grid(map, base_dir),
        DataType::Structure(st) => {
            if map.contains_key(LAYOUT_KEY) && st.position(LAYOUT_KEY).is_none() {
                bind_grid(map, base_dir)
            } else {
                bind_struct(map, st, base_dir)
            }
        }
        _ => Err(mismatch("a scalar", ty)),
    }
}

fn bind_struct(map: &Mapping, st: &StructType, base_dir: &Path) -> Result<FieldValue> {
    let mut items = Vec::with_capacity(map.len());
    for (key, value) in map {
        let name = key_name(key)?;
        let (_, sub_type) = st
            .fields
            .iter()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| ValueError::Mismatch {
                expected: format!("a sub-field of {} (not '{}')", st.name, name),
                type_name: st.name.clone(),
            })?;
        let bound = bind(value, sub_type, base_dir).map_err(|e| e.in_field(&st.name, &name))?;
        items.push((name, bound));
    }
    Ok(FieldValue::Struct(items))
}

fn bind_bits(map: &Mapping, ty: &DataType) -> Result<FieldValue> {
    let mut bits = Vec::with_capacity(map.len());
    for (key, value) in map {
        let symbols: OneOrMany = serde_yaml::from_value(value.clone())
            .map_err(|_| mismatch("a symbol or list of symbols per bitfield", ty))?;
        bits.push((key_name(key)?, symbols.into_vec()));
    }
    Ok(FieldValue::Bits(bits))
}

fn bind_grid(map: &Mapping, base_dir: &Path) -> Result<FieldValue> {
    let raw: RawGrid = from_mapping(map, "sprite grid")?;
    Ok(FieldValue::Grid(SheetGrid {
        sheet: base_dir.join(raw.sheet),
        cell_width: raw.cell_width,
        cell_height: raw.cell_height,
        x_offset: raw.x_offset,
        y_offset: raw.y_offset,
        layout: raw.layout,
    }))
}

fn bind_text(map: &Mapping) -> Result<FieldValue> {
    let mut bundle = TextBundle::new();
    for (key, languages) in map {
        let name = key_name(key)?;
        let languages = languages
            .as_mapping()
            .ok_or_else(|| ValueError::Text(format!("'{}' needs a mapping of languages", name)))?;
        for (language, forms) in languages {
            let forms: OneOrMany = serde_yaml::from_value(forms.clone()).map_err(|_| {
                ValueError::Text(format!("'{}' needs a string or list of plural forms", name))
            })?;
            bundle.add(&name, &key_name(language)?, forms.into_vec())?;
        }
    }
    Ok(FieldValue::Text(bundle))
}

fn from_mapping<T: serde::de::DeserializeOwned>(map: &Mapping, what: &str) -> Result<T> {
    serde_yaml::from_value(Yaml::Mapping(map.clone())).map_err(|e| RcdError::Parse {
        message: format!("Invalid {}: {}", what, e),
        help: None,
    })
}

fn key_name(key: &Yaml) -> Result<String> {
    match key {
        Yaml::String(s) => Ok(s.clone()),
        other => Err(RcdError::Parse {
            message: format!("Expected a name, found {:?}", other),
            help: None,
        }),
    }
}

fn mismatch(expected: &str, ty: &DataType) -> RcdError {
    ValueError::Mismatch {
        expected: expected.to_string(),
        type_name: ty.name(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema;
    use crate::types::RefKind;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn yaml(s: &str) -> Yaml {
        serde_yaml::from_str(s).unwrap()
    }

    fn sprite() -> DataType {
        DataType::BlockReference(RefKind::Sprite)
    }

    #[test]
    fn test_scalars() {
        let ty = DataType::Numeric(crate::types::NumericType::Uint8);
        let base = Path::new(".");
        assert_eq!(bind(&yaml("12"), &ty, base).unwrap(), FieldValue::Number(12));
        assert_eq!(
            bind(&yaml("'0x10'"), &ty, base).unwrap(),
            FieldValue::Symbol("0x10".to_string())
        );
        assert_eq!(bind(&yaml("~"), &sprite(), base).unwrap(), FieldValue::Block(None));
        assert!(bind(&yaml("1.5"), &ty, base).is_err());
        assert!(bind(&yaml("true"), &ty, base).is_err());
    }

    #[test]
    fn test_region_relative_to_data_file() {
        let value = yaml("{ sheet: shop.png, x: 4, width: 8, height: 8, x_offset: -4 }");
        let bound = bind(&value, &sprite(), Path::new("data")).unwrap();
        assert_eq!(
            bound,
            FieldValue::Image(ImageRegion {
                sheet: PathBuf::from("data/shop.png"),
                x: 4,
                y: 0,
                width: Some(8),
                height: Some(8),
                x_offset: -4,
                y_offset: 0,
                crop: true,
            })
        );
    }

    #[test]
    fn test_struct_list_and_bits() {
        let schema = parse_schema(
            r#"
enums:
  - { name: dir, type: uint8, values: { N: 0, E: 1 } }
bitsets:
  - name: edges
    storage: uint8
    fields:
      - { name: open, enum: dir, start: 0, max: 2, bit_index: true }
structs:
  - name: pair
    fields:
      - { name: a, type: uint8 }
      - { name: b, type: edges }
"#,
        )
        .unwrap();
        let pair = schema.registry().get("pair").unwrap();

        let bound = bind(&yaml("{ a: 1, b: { open: [N, E] } }"), pair, Path::new(".")).unwrap();
        assert_eq!(
            bound,
            FieldValue::Struct(vec![
                ("a".to_string(), FieldValue::Number(1)),
                (
                    "b".to_string(),
                    FieldValue::Bits(vec![(
                        "open".to_string(),
                        vec!["N".to_string(), "E".to_string()]
                    )])
                ),
            ])
        );

        assert!(bind(&yaml("{ c: 1 }"), pair, Path::new(".")).is_err());
    }

    #[test]
    fn test_grid_for_list() {
        let ty = DataType::List(std::sync::Arc::new(crate::types::ListType {
            count: crate::types::NumericType::Uint8,
            element: sprite(),
        }));
        let bound = bind(
            &yaml("{ sheet: tiles.png, x_offset: -8, layout: [[a, b], [c, d]] }"),
            &ty,
            Path::new("art"),
        )
        .unwrap();
        match bound {
            FieldValue::Grid(grid) => {
                assert_eq!(grid.sheet, PathBuf::from("art/tiles.png"));
                assert_eq!(grid.layout.len(), 2);
                assert_eq!(grid.x_offset, -8);
            }
            other => panic!("expected a grid, got {:?}", other),
        }
    }

    #[test]
    fn test_text_bundle() {
        let bound = bind(
            &yaml("{ title: { en_GB: Shop, nl_NL: [Winkel, Winkels] } }"),
            &DataType::Text,
            Path::new("."),
        )
        .unwrap();
        let FieldValue::Text(bundle) = bound else {
            panic!("expected text");
        };
        let (name, languages) = bundle.strings().next().unwrap();
        assert_eq!(name, "title");
        assert_eq!(languages["nl_NL"], vec!["Winkel", "Winkels"]);
    }
}
