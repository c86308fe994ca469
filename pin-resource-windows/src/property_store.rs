//! Typed reads from an `IPropertyStore`.
//!
//! An empty value (`VT_EMPTY`) reads as `None`. A value of the wrong variant
//! type is a query failure.

use windows::core::{BSTR, GUID, PWSTR};
use windows::Win32::Foundation::PROPERTYKEY;
use windows::Win32::System::Com::StructuredStorage::{PropVariantGetElementCount, PropVariantGetStringElem, PROPVARIANT};
use windows::Win32::System::Com::CoTaskMemFree;
use windows::Win32::System::Variant::{VARENUM, VT_BLOB, VT_BOOL, VT_EMPTY, VT_LPWSTR, VT_UI4, VT_VECTOR};
use windows::Win32::UI::Shell::PropertiesSystem::IPropertyStore;

use pin_resource_core::DirectoryError;

use crate::property_layout::PropertyAddress;

pub fn property_key(address: PropertyAddress) -> PROPERTYKEY {
    PROPERTYKEY {
        fmtid: GUID::from_u128(address.fmtid),
        pid: address.pid,
    }
}

pub struct PropertyReader<'a> {
    store: &'a IPropertyStore,
}

impl<'a> PropertyReader<'a> {
    pub fn new(store: &'a IPropertyStore) -> Self {
        Self { store }
    }

    pub fn string(&self, address: PropertyAddress) -> Result<Option<String>, DirectoryError> {
        let Some(value) = self.value(address)? else {
            return Ok(None);
        };
        expect_type(address, &value, VT_LPWSTR)?;
        let text = BSTR::try_from(&value).map_err(|e| failed(address, e))?;
        Ok(Some(text.to_string()))
    }

    /// A `VT_VECTOR | VT_LPWSTR` list; a single string reads as a one-entry list.
    pub fn string_list(&self, address: PropertyAddress) -> Result<Option<Vec<String>>, DirectoryError> {
        let Some(value) = self.value(address)? else {
            return Ok(None);
        };
        if value.vt() == VT_LPWSTR {
            let text = BSTR::try_from(&value).map_err(|e| failed(address, e))?;
            return Ok(Some(vec![text.to_string()]));
        }
        expect_type(address, &value, VARENUM(VT_VECTOR.0 | VT_LPWSTR.0))?;
        // SAFETY: the variant holds a string vector; each element is copied
        // out and released before the next is read.
        unsafe {
            let count = PropVariantGetElementCount(&value);
            let mut entries = Vec::with_capacity(count as usize);
            for index in 0..count {
                let element: PWSTR = PropVariantGetStringElem(&value, index).map_err(|e| failed(address, e))?;
                entries.push(element.to_string().unwrap_or_default());
                CoTaskMemFree(Some(element.0 as *const _));
            }
            Ok(Some(entries))
        }
    }

    pub fn u32(&self, address: PropertyAddress) -> Result<Option<u32>, DirectoryError> {
        let Some(value) = self.value(address)? else {
            return Ok(None);
        };
        expect_type(address, &value, VT_UI4)?;
        u32::try_from(&value).map(Some).map_err(|e| failed(address, e))
    }

    pub fn bool(&self, address: PropertyAddress) -> Result<Option<bool>, DirectoryError> {
        let Some(value) = self.value(address)? else {
            return Ok(None);
        };
        expect_type(address, &value, VT_BOOL)?;
        bool::try_from(&value).map(Some).map_err(|e| failed(address, e))
    }

    pub fn blob(&self, address: PropertyAddress) -> Result<Option<Vec<u8>>, DirectoryError> {
        let Some(value) = self.value(address)? else {
            return Ok(None);
        };
        expect_type(address, &value, VT_BLOB)?;
        // SAFETY: vt is VT_BLOB, so the blob member of the union is active and
        // describes `cbSize` readable bytes owned by `value`.
        let bytes = unsafe {
            let blob = value.as_raw().Anonymous.Anonymous.Anonymous.blob;
            if blob.pBlobData.is_null() || blob.cbSize == 0 {
                Vec::new()
            } else {
                std::slice::from_raw_parts(blob.pBlobData as *const u8, blob.cbSize as usize).to_vec()
            }
        };
        Ok(Some(bytes))
    }

    fn value(&self, address: PropertyAddress) -> Result<Option<PROPVARIANT>, DirectoryError> {
        let key = property_key(address);
        // SAFETY: `key` outlives the call; the returned variant owns its data.
        let value = unsafe { self.store.GetValue(&key) }.map_err(|e| failed(address, e))?;
        if value.vt() == VT_EMPTY {
            return Ok(None);
        }
        Ok(Some(value))
    }
}

fn expect_type(address: PropertyAddress, value: &PROPVARIANT, expected: VARENUM) -> Result<(), DirectoryError> {
    if value.vt() == expected {
        return Ok(());
    }
    Err(DirectoryError::query_failed(
        "GetValue",
        format!("{} has variant type {} (expected {})", describe(address), value.vt().0, expected.0),
    ))
}

fn failed(address: PropertyAddress, error: windows::core::Error) -> DirectoryError {
    DirectoryError::query_failed("GetValue", format!("{}: {}", describe(address), error))
}

fn describe(address: PropertyAddress) -> String {
    format!("{{{:?}}},{}", GUID::from_u128(address.fmtid), address.pid)
}
