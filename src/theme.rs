//! Fixed vocabularies of the distribution service.
//!
//! Every type here parses from and prints as the exact string the service
//! uses in URLs, file names and catalog documents.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($wire => Ok($name::$variant),)+
                    other => Err(Error::InvalidParameter(format!(
                        "unknown {} '{}' (allowed: {})",
                        $what,
                        other,
                        [$($wire),+].join(", ")
                    ))),
                }
            }
        }
    };
}

wire_enum! {
    /// A top-level geodata category served by the distribution service.
    Theme, "theme" {
        CoastalLines => "coas",
        Communes => "communes",
        Countries => "countries",
        LocalAdministrativeUnits => "lau",
        Nuts => "nuts",
        UrbanAudit => "urau",
        PostalCodes => "pcode",
    }
}

impl Theme {
    /// Leading token of this theme's file names.
    ///
    /// It does not follow the theme code (communes files start with `COMM`),
    /// so it is listed per theme.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Theme::CoastalLines => "COAS",
            Theme::Communes => "COMM",
            Theme::Countries => "CNTR",
            Theme::LocalAdministrativeUnits => "LAU",
            Theme::Nuts => "NUTS",
            Theme::UrbanAudit => "URAU",
            Theme::PostalCodes => "PCODE",
        }
    }

    /// Themes whose geometry is published per unit under `distribution/`.
    pub fn has_unit_distribution(&self) -> bool {
        matches!(self, Theme::Countries | Theme::Nuts | Theme::UrbanAudit)
    }
}

wire_enum! {
    /// Geometric representation of a unit or file.
    SpatialType, "spatial type" {
        Attributes => "AT",
        Boundary => "BN",
        Label => "LB",
        Region => "RG",
        Point => "PT",
    }
}

wire_enum! {
    Scale, "scale" {
        K100 => "100K",
        M01 => "01M",
        M03 => "03M",
        M10 => "10M",
        M20 => "20M",
        M60 => "60M",
    }
}

wire_enum! {
    /// EPSG code of the coordinate reference system.
    Projection, "projection" {
        Epsg4326 => "4326",
        Epsg3035 => "3035",
        Epsg3857 => "3857",
    }
}

wire_enum! {
    FileFormat, "file format" {
        Csv => "csv",
        GeoJson => "geojson",
        Pbf => "pbf",
        Shp => "shp",
        Svg => "svg",
        TopoJson => "topojson",
    }
}

wire_enum! {
    CountryBoundary, "country boundary" {
        Inland => "INLAND",
        Coastal => "COASTL",
    }
}

wire_enum! {
    NutsLevel, "NUTS level" {
        Level0 => "LEVL_0",
        Level1 => "LEVL_1",
        Level2 => "LEVL_2",
        Level3 => "LEVL_3",
    }
}

impl NutsLevel {
    /// Number of digits in a unit id at this level (`RO21` is level 2).
    pub fn digits(&self) -> usize {
        match self {
            NutsLevel::Level0 => 0,
            NutsLevel::Level1 => 1,
            NutsLevel::Level2 => 2,
            NutsLevel::Level3 => 3,
        }
    }
}

wire_enum! {
    /// Urban audit unit category, encoded as the last letter of the unit id.
    UrbanAuditCategory, "urban audit category" {
        City => "C",
        FunctionalUrbanArea => "F",
    }
}

wire_enum! {
    /// Keys of a dataset's properties document.
    Property, "property" {
        Date => "date",
        Documentation => "documentation",
        Files => "files",
        Hashtag => "hashtag",
        Metadata => "metadata",
        Packages => "packages",
        Title => "title",
        TitleMultilingual => "titleMultilingual",
        Units => "units",
    }
}

wire_enum! {
    Language, "language" {
        German => "de",
        English => "en",
        French => "fr",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings_parse_back() {
        for theme in Theme::ALL {
            assert_eq!(theme.as_str().parse::<Theme>().unwrap(), *theme);
        }
        for scale in Scale::ALL {
            assert_eq!(scale.to_string().parse::<Scale>().unwrap(), *scale);
        }
        assert_eq!("LEVL_2".parse::<NutsLevel>().unwrap().digits(), 2);
    }

    #[test]
    fn unknown_value_lists_allowed() {
        let err = "XX".parse::<SpatialType>().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("'XX'"));
        assert!(text.contains("AT, BN, LB, RG, PT"));
    }

    #[test]
    fn communes_prefix_differs_from_code() {
        assert_eq!(Theme::Communes.as_str(), "communes");
        assert_eq!(Theme::Communes.file_prefix(), "COMM");
        assert!(!Theme::CoastalLines.has_unit_distribution());
        assert!(Theme::UrbanAudit.has_unit_distribution());
    }
}
