//RFC covered: RFC4331 (Quota and Size Properties for DAV Collections)

#[derive(Debug, PartialEq, Clone)]
pub enum PropertyRequest {
    QuotaAvailableBytes,
    QuotaUsedBytes,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Property {
    /// 3. DAV:quota-available-bytes
    ///
    /// The amount of additional storage, in bytes, available to be
    /// allocated to the resource.
    QuotaAvailableBytes(u64),

    /// 4. DAV:quota-used-bytes
    ///
    /// The amount of storage, in bytes, counted against the quota
    /// of the resource.
    QuotaUsedBytes(u64),
}
