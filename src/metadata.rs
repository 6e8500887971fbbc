//! NetCDF metadata inspection and variable description functionality
//!
//! Used before a trend run to find the temperature variable, its dimension
//! order and the time attributes that decide how it is decoded.

use crate::errors::{Result, TrendError};
use netcdf::{AttributeValue, File, Variable};

/// Structured metadata for a NetCDF variable
#[derive(Debug, Clone)]
pub struct VariableMetadata {
    pub name: String,
    pub data_type: String,
    pub dimensions: Vec<DimensionInfo>,
    pub attributes: Vec<(String, AttributeValue)>,
    pub total_elements: usize,
}

impl VariableMetadata {
    /// Dimension names in storage order
    #[must_use]
    pub fn dimension_names(&self) -> Vec<&str> {
        self.dimensions.iter().map(|d| d.name.as_str()).collect()
    }

    /// Extents in storage order
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.length).collect()
    }
}

/// Information about a dimension
#[derive(Debug, Clone)]
pub struct DimensionInfo {
    pub name: String,
    pub length: usize,
    pub is_unlimited: bool,
}

/// Get structured metadata for a variable
///
/// # Errors
///
/// Returns [`TrendError::VariableNotFound`] if the variable does not exist.
pub fn get_variable_metadata(file: &File, var_name: &str) -> Result<VariableMetadata> {
    let var = file
        .variable(var_name)
        .ok_or_else(|| TrendError::VariableNotFound {
            var: var_name.to_string(),
        })?;
    Ok(metadata_of(&var))
}

fn metadata_of(var: &Variable) -> VariableMetadata {
    let dimensions: Vec<DimensionInfo> = var
        .dimensions()
        .iter()
        .map(|d| DimensionInfo {
            name: d.name(),
            length: d.len(),
            is_unlimited: d.is_unlimited(),
        })
        .collect();

    let attributes = var
        .attributes()
        .filter_map(|attr| attr.value().ok().map(|value| (attr.name().to_string(), value)))
        .collect();

    VariableMetadata {
        name: var.name(),
        data_type: format!("{:?}", var.vartype()).to_lowercase(),
        total_elements: dimensions.iter().map(|d| d.length).product(),
        dimensions,
        attributes,
    }
}

/// Prints global attributes and variables of a NetCDF file.
///
/// # Errors
///
/// Returns an error if an attribute cannot be read.
pub fn print_metadata(file: &File) -> Result<()> {
    println!("\n===== Global Attributes =====");
    for attr in file.attributes() {
        println!("- {}: {}", attr.name(), format_value(&attr.value()?));
    }

    println!("\n===== Variables =====");
    for var in file.variables() {
        let dims: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| format!("{}[{}]", d.name(), d.len()))
            .collect();
        println!("- {} ({})", var.name(), dims.join(", "));
    }

    Ok(())
}

/// Lists all variables and dimensions, sorted by name.
///
/// # Errors
///
/// Currently infallible; kept fallible for parity with the other printers.
pub fn list_variables_and_dimensions(file: &File) -> Result<()> {
    println!("\n Dimensions");
    println!("==============");

    let mut dimensions: Vec<_> = file.dimensions().collect();
    dimensions.sort_by_key(|d| d.name());
    if dimensions.is_empty() {
        println!("   (No dimensions found)");
    }
    for dim in dimensions {
        let unlimited = if dim.is_unlimited() { " (unlimited)" } else { "" };
        println!("    {} = {}{}", dim.name(), dim.len(), unlimited);
    }

    println!("\n Variables");
    println!("=============");

    let mut variables: Vec<VariableMetadata> = file.variables().map(|v| metadata_of(&v)).collect();
    variables.sort_by(|a, b| a.name.cmp(&b.name));
    if variables.is_empty() {
        println!("   (No variables found)");
    }
    for meta in &variables {
        if meta.dimensions.is_empty() {
            println!("    {} ({}): scalar", meta.name, meta.data_type);
            continue;
        }
        let shape: Vec<String> = meta.shape().iter().map(ToString::to_string).collect();
        println!(
            "    {} ({}): [{}] = ({})",
            meta.name,
            meta.data_type,
            meta.dimension_names().join(", "),
            shape.join(" x ")
        );

        let key_attrs: Vec<String> = meta
            .attributes
            .iter()
            .filter(|(name, _)| {
                matches!(name.as_str(), "units" | "long_name" | "calendar" | "_FillValue")
            })
            .map(|(name, value)| format!("{name}: {}", format_value(value)))
            .collect();
        if !key_attrs.is_empty() {
            println!("      - {}", key_attrs.join(", "));
        }
    }

    println!("\nTip: Use --trend --var <variable> to compute per-cell trends");
    Ok(())
}

/// Describes a specific variable showing its data type, shape, and all attributes.
///
/// # Errors
///
/// Returns [`TrendError::VariableNotFound`] if the variable does not exist.
pub fn describe_variable(file: &File, var_name: &str) -> Result<()> {
    let meta = get_variable_metadata(file, var_name)?;

    println!("\n Variable Description: {}", meta.name);
    println!("={}", "=".repeat(meta.name.len() + 25));
    println!(" Data type: {}", meta.data_type);

    if meta.dimensions.is_empty() {
        println!(" Dimensions: (scalar)");
    } else {
        println!(" Dimensions: [{}]", meta.dimension_names().join(", "));
        for dim in &meta.dimensions {
            let unlimited = if dim.is_unlimited { " (unlimited)" } else { "" };
            println!("    {} = {}{}", dim.name, dim.length, unlimited);
        }
    }

    if meta.attributes.is_empty() {
        println!("\n  Attributes: (none)");
    } else {
        println!("\n  Attributes:");
        for (name, value) in &meta.attributes {
            println!("   - {}: {}", name, format_value(value));
        }
    }

    println!("\n Total elements: {}", meta.total_elements);
    Ok(())
}

fn format_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Str(s) => format!("\"{s}\""),
        AttributeValue::Float(v) => v.to_string(),
        AttributeValue::Double(v) => v.to_string(),
        AttributeValue::Int(v) => v.to_string(),
        AttributeValue::Short(v) => v.to_string(),
        other => format!("{other:?}"),
    }
}
