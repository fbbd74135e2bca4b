use super::AamvaFields;

/// Applies a trimmed element value to the fields being collected.
pub type ElementSetter = fn(&mut AamvaFields, &str);

macro_rules! data_elements {
	($(#[$enum_meta:meta])* $vis:vis enum $enum_id:ident { $($(#[$meta:meta])* $id:ident : $tag:literal => $setter:path),* }) => {
		$(#[$enum_meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
		$vis enum $enum_id {
			$($(#[$meta])* $id),*
		}

		impl $enum_id {
			pub const COUNT: usize = data_elements!(@count $($id,)*);
			pub const LIST: [Self; Self::COUNT] = [$(Self::$id),*];

			pub fn from_id(id: &[u8; 3]) -> Option<Self> {
				match id {
					$($tag => Some(Self::$id),)*
					_ => None
				}
			}

			pub fn id(&self) -> &'static [u8; 3] {
				match self {
					$(Self::$id => $tag),*
				}
			}

			pub fn string_id(&self) -> &str {
				unsafe { std::str::from_utf8_unchecked(self.id()) }
			}

			pub fn setter(&self) -> ElementSetter {
				match self {
					$(Self::$id => $setter as ElementSetter),*
				}
			}
		}
	};
	(@count $a:ident, $($rest:ident,)*) => {
		1usize + data_elements!(@count $($rest,)*)
	};
	(@count) => {
		0usize
	}
}

data_elements! {
    /// AAMVA data elements extracted into a license record.
    ///
    /// See: <https://www.aamva.org/assets/best-practices,-guides,-standards,-manuals,-whitepapers/aamva-dl-id-card-design-standard-(2020)>
    pub enum DataElement {
        /// Customer Family Name (DCS).
        CustomerFamilyName: b"DCS" => AamvaFields::set_last_name,

        /// Customer First Name (DAC).
        CustomerFirstName: b"DAC" => AamvaFields::set_first_name,

        /// Customer Middle Name(s) (DAD).
        CustomerMiddleName: b"DAD" => AamvaFields::set_middle_name,

        /// Document Expiration Date (DBA).
        DocumentExpirationDate: b"DBA" => AamvaFields::set_expiry_date,

        /// Document Issue Date (DBD).
        DocumentIssueDate: b"DBD" => AamvaFields::set_issue_date,

        /// Date of Birth (DBB).
        DateOfBirth: b"DBB" => AamvaFields::set_dob,

        /// Physical Description – Sex (DBC).
        PhysicalDescriptionSex: b"DBC" => AamvaFields::set_sex,

        /// Physical Description – Height (DAU).
        PhysicalDescriptionHeight: b"DAU" => AamvaFields::set_height,

        /// Address – Street 1 (DAG).
        AddressStreet1: b"DAG" => AamvaFields::set_address,

        /// Address – City (DAI).
        AddressCity: b"DAI" => AamvaFields::set_city,

        /// Address – Jurisdiction Code (DAJ).
        AddressJurisdictionCode: b"DAJ" => AamvaFields::set_state,

        /// Address – Postal Code (DAK).
        AddressPostalCode: b"DAK" => AamvaFields::set_postal,

        /// Customer ID Number (DAQ).
        CustomerIdNumber: b"DAQ" => AamvaFields::set_id_number,

        /// Document Discriminator (DCF), preferred over DAQ as license number.
        DocumentDiscriminator: b"DCF" => AamvaFields::set_document_discriminator
    }
}

impl DataElement {
    /// Splits a line into its element and trimmed value.
    ///
    /// Lines whose first three bytes are not a known element yield `None`.
    pub fn split_line(line: &str) -> Option<(Self, &str)> {
        let id: &[u8; 3] = line.as_bytes().get(..3)?.try_into().ok()?;
        let element = Self::from_id(id)?;
        // The three id bytes are ASCII, so byte 3 is a char boundary.
        Some((element, line[3..].trim()))
    }
}
