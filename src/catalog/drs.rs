/*! Data Reference Syntax (DRS) schemes this crate recognizes.
 *
 * A scheme names the directory layout a storage site uses below its root
 * paths. The scanner never interprets the layout itself, it only walks the
 * tree and reads file names, so the scheme is an opaque label used for
 * configuration validation and reporting.
 */
use strum::{EnumIter, EnumString, IntoStaticStr};

/// Known DRS directory-layout identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum DrsScheme {
    /// Flat layout with all files directly below the root.
    #[strum(serialize = "default")]
    Default,
    /// The layout used at the Centre for Environmental Data Analysis.
    #[strum(serialize = "BADC")]
    Badc,
    /// The layout used at the German Climate Computing Center.
    #[strum(serialize = "DKRZ")]
    Dkrz,
    /// The layout used at ETH Zurich.
    #[strum(serialize = "ETHZ")]
    Ethz,
    /// The layout produced by ESGF download tools.
    #[strum(serialize = "ESGF")]
    Esgf,
    /// The layout used at the Swedish Meteorological and Hydrological Institute.
    #[strum(serialize = "SMHI")]
    Smhi,
}

impl Default for DrsScheme {
    fn default() -> Self {
        DrsScheme::Default
    }
}

impl DrsScheme {
    /// The identifier used for this scheme in run configurations.
    pub fn name(&self) -> &'static str {
        (*self).into()
    }

    /// A human-readable sketch of the directory layout below a root path.
    ///
    /// Purely informational, shown by `showcatalog` so a user can eyeball
    /// whether a root was configured with the right scheme.
    pub fn layout_hint(&self) -> &'static str {
        use DrsScheme::*;

        match self {
            Default => "<root>/",
            Badc => "<root>/<institute>/<dataset>/<experiment>/<ensemble>/<mip>/<variable>/<grid>/<version>/",
            Dkrz => "<root>/<activity>/<institute>/<dataset>/<experiment>/<ensemble>/<mip>/<variable>/<grid>/<version>/",
            Ethz => "<root>/<experiment>/<mip>/<variable>/<dataset>/<ensemble>/<grid>/",
            Esgf => "<root>/<project>/<activity>/<institute>/<dataset>/<experiment>/<ensemble>/<mip>/<variable>/<grid>/<version>/",
            Smhi => "<root>/<dataset>/<ensemble>/<experiment>/<frequency>/",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn scheme_names_round_trip() {
        for scheme in DrsScheme::iter() {
            assert_eq!(DrsScheme::from_str(scheme.name()).unwrap(), scheme);
        }
    }

    #[test]
    fn scheme_parsing_is_case_insensitive() {
        assert_eq!(DrsScheme::from_str("badc").unwrap(), DrsScheme::Badc);
        assert_eq!(DrsScheme::from_str("Default").unwrap(), DrsScheme::Default);
    }

    #[test]
    fn unknown_scheme_does_not_parse() {
        assert!(DrsScheme::from_str("NCAR").is_err());
    }
}
