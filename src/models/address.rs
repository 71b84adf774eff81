use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressItem {
    #[serde(alias = "_id")]
    pub id: String,
    pub recipient_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Address form as submitted by the user, before the backend assigns an id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AddressForm {
    pub recipient_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddressListResponse {
    #[serde(default)]
    pub addresses: Vec<AddressItem>,
}

#[derive(Debug, Deserialize)]
pub struct AddressResponse {
    pub address: AddressItem,
}
