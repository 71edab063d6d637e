pub type Endpoint = str;

pub const DEVICES: &Endpoint = "/sign/device/list";
pub const DEVICE_QUOTA: &Endpoint = "/sign/device/quota";
pub const DEVICE_QUOTA_ALL: &Endpoint = "/sign/device/quota/all";
