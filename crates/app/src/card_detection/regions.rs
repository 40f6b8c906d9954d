//! Region tables accepted by the upstream per product.

/// A numbered upstream region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub id: i32,
    pub name: &'static str,
}

const fn region(id: i32, name: &'static str) -> Region {
    Region { id, name }
}

pub const ITUNES_REGIONS: &[Region] = &[
    region(1, "英国"),
    region(2, "美国"),
    region(3, "德国"),
    region(4, "澳大利亚"),
    region(5, "加拿大"),
    region(6, "日本"),
    region(8, "西班牙"),
    region(9, "意大利"),
    region(10, "法国"),
    region(11, "爱尔兰"),
    region(12, "墨西哥"),
];

pub const AMAZON_REGIONS: &[Region] = &[region(2, "美亚/加亚"), region(1, "欧盟区")];

pub const RAZER_REGIONS: &[Region] = &[
    region(12, "美国"),
    region(6, "澳大利亚"),
    region(13, "巴西"),
    region(26, "柬埔寨"),
    region(20, "加拿大"),
    region(25, "智利"),
    region(22, "哥伦比亚"),
    region(17, "香港特别行政区"),
    region(4, "印度"),
    region(7, "印度尼西亚"),
    region(27, "日本"),
    region(1, "马来西亚"),
    region(19, "缅甸"),
    region(15, "新西兰"),
    region(29, "巴基斯坦"),
    region(8, "菲律宾"),
    region(5, "新加坡"),
    region(18, "土耳其"),
    region(33, "越南"),
    region(2, "其他"),
    region(28, "其他（中文）"),
    region(21, "墨西哥"),
];

/// Xbox regions are addressed by name only.
pub const XBOX_REGIONS: &[&str] = &[
    "美国",
    "加拿大",
    "英国",
    "澳大利亚",
    "新西兰",
    "新加坡",
    "韩国",
    "墨西哥",
    "瑞典",
    "哥伦比亚",
    "阿根廷",
    "尼日利亚",
    "香港特别行政区",
    "挪威",
    "波兰",
    "德国",
];

pub(crate) fn contains_id(regions: &[Region], id: i32) -> bool {
    regions.iter().any(|region| region.id == id)
}

pub(crate) fn contains_name(regions: &[&str], name: &str) -> bool {
    regions.contains(&name)
}
