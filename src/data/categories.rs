use crate::models::ItemCategory;

/// Trade site category id for an item category, `None` when the site has no such filter.
pub fn category_trade_id(category: ItemCategory) -> Option<&'static str> {
    let id = match category {
        ItemCategory::Map => "map",
        ItemCategory::AbyssJewel => "jewel.abyss",
        ItemCategory::Amulet => "accessory.amulet",
        ItemCategory::Belt => "accessory.belt",
        ItemCategory::BodyArmour => "armour.chest",
        ItemCategory::Boots => "armour.boots",
        ItemCategory::Bow => "weapon.bow",
        ItemCategory::Claw => "weapon.claw",
        ItemCategory::Dagger => "weapon.dagger",
        ItemCategory::FishingRod => "weapon.rod",
        ItemCategory::Flask => "flask",
        ItemCategory::Gloves => "armour.gloves",
        ItemCategory::Helmet => "armour.helmet",
        ItemCategory::Jewel => "jewel",
        ItemCategory::OneHandedAxe => "weapon.oneaxe",
        ItemCategory::OneHandedMace => "weapon.onemace",
        ItemCategory::OneHandedSword => "weapon.onesword",
        ItemCategory::Quiver => "armour.quiver",
        ItemCategory::Ring => "accessory.ring",
        ItemCategory::RuneDagger => "weapon.runedagger",
        ItemCategory::Sceptre => "weapon.sceptre",
        ItemCategory::Shield => "armour.shield",
        ItemCategory::Staff => "weapon.staff",
        ItemCategory::TwoHandedAxe => "weapon.twoaxe",
        ItemCategory::TwoHandedMace => "weapon.twomace",
        ItemCategory::TwoHandedSword => "weapon.twosword",
        ItemCategory::Wand => "weapon.wand",
        ItemCategory::Warstaff => "weapon.warstaff",
        ItemCategory::ClusterJewel => "jewel.cluster",
        ItemCategory::HeistBlueprint => "heistmission.blueprint",
        ItemCategory::HeistContract => "heistmission.contract",
        ItemCategory::HeistTool => "heistequipment.heisttool",
        ItemCategory::HeistBrooch => "heistequipment.heistreward",
        ItemCategory::HeistGear => "heistequipment.heistweapon",
        ItemCategory::HeistCloak => "heistequipment.heistutility",
        ItemCategory::Trinket => "accessory.trinket",
        ItemCategory::SanctumRelic => "sanctum.relic",
        ItemCategory::Tincture => "tincture",
        ItemCategory::Charm => "azmeri.charm",
        ItemCategory::Crossbow => "weapon.crossbow",
        ItemCategory::SkillGem => "gem.activegem",
        ItemCategory::SupportGem => "gem.supportgem",
        ItemCategory::MetaGem => "gem.metagem",
        _ => return None,
    };
    Some(id)
}
