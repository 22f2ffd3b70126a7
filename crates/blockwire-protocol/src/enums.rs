//! Symbolic value tables for enumerated fields.
//!
//! Each table is a fixed, bidirectional mapping between wire integers and
//! names. Decoding an integer that is not in the table is a hard error.

/// A bidirectional name ↔ integer table.
#[derive(Debug)]
pub struct EnumTable {
    entries: &'static [(&'static str, i64)],
}

impl EnumTable {
    pub const fn new(entries: &'static [(&'static str, i64)]) -> Self {
        Self { entries }
    }

    /// The symbol for a wire value.
    pub fn symbol(&self, value: i64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| *name)
    }

    /// The wire value for a symbol.
    pub fn value(&self, symbol: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(name, _)| *name == symbol)
            .map(|(_, v)| *v)
    }

    pub fn entries(&self) -> &'static [(&'static str, i64)] {
        self.entries
    }
}

/// Block faces used by dig and build. `noop` is the "no face" marker.
pub const FACE: EnumTable = EnumTable::new(&[
    ("noop", -1),
    ("-y", 0),
    ("+y", 1),
    ("-z", 2),
    ("+z", 3),
    ("-x", 4),
    ("+x", 5),
]);

pub const DIMENSION: EnumTable =
    EnumTable::new(&[("earth", 0), ("sky", 1), ("nether", 255)]);

pub const DIFFICULTY: EnumTable = EnumTable::new(&[
    ("peaceful", 0),
    ("easy", 1),
    ("normal", 2),
    ("hard", 3),
]);

pub const MODE: EnumTable =
    EnumTable::new(&[("survival", 0), ("creative", 1), ("adventure", 2)]);

/// Potion effects.
pub const EFFECT: EnumTable = EnumTable::new(&[
    ("move_fast", 1),
    ("move_slow", 2),
    ("dig_fast", 3),
    ("dig_slow", 4),
    ("damage_boost", 5),
    ("heal", 6),
    ("harm", 7),
    ("jump", 8),
    ("confusion", 9),
    ("regenerate", 10),
    ("resistance", 11),
    ("fire_resistance", 12),
    ("water_resistance", 13),
    ("invisibility", 14),
    ("blindness", 15),
    ("night_vision", 16),
    ("hunger", 17),
    ("weakness", 18),
    ("poison", 19),
    ("wither", 20),
]);

/// Digging progress. `shooting` also covers eating.
pub const DIG_STATE: EnumTable = EnumTable::new(&[
    ("started", 0),
    ("cancelled", 1),
    ("stopped", 2),
    ("checked", 3),
    ("dropped", 4),
    ("shooting", 5),
]);

pub const ANIMATION: EnumTable = EnumTable::new(&[
    ("noop", 0),
    ("arm", 1),
    ("hit", 2),
    ("leave_bed", 3),
    ("eat", 5),
    ("unknown", 102),
    ("crouch", 104),
    ("uncrouch", 105),
]);

pub const ACTION: EnumTable = EnumTable::new(&[
    ("crouch", 1),
    ("uncrouch", 2),
    ("leave_bed", 3),
    ("start_sprint", 4),
    ("stop_sprint", 5),
]);

/// Object and vehicle kinds.
pub const VEHICLE: EnumTable = EnumTable::new(&[
    ("boat", 1),
    ("minecart", 10),
    ("storage_cart", 11),
    ("powered_cart", 12),
    ("tnt", 50),
    ("ender_crystal", 51),
    ("arrow", 60),
    ("snowball", 61),
    ("egg", 62),
    ("thrown_enderpearl", 65),
    ("wither_skull", 66),
    ("falling_block", 70),
    ("ender_eye", 72),
    ("thrown_potion", 73),
    ("dragon_egg", 74),
    ("thrown_xp_bottle", 75),
    ("fishing_float", 90),
]);

pub const MOB: EnumTable = EnumTable::new(&[
    ("Creeper", 50),
    ("Skeleton", 51),
    ("Spider", 52),
    ("GiantZombie", 53),
    ("Zombie", 54),
    ("Slime", 55),
    ("Ghast", 56),
    ("ZombiePig", 57),
    ("Enderman", 58),
    ("CaveSpider", 59),
    ("Silverfish", 60),
    ("Blaze", 61),
    ("MagmaCube", 62),
    ("EnderDragon", 63),
    ("Wither", 64),
    ("Bat", 65),
    ("Witch", 66),
    ("Pig", 90),
    ("Sheep", 91),
    ("Cow", 92),
    ("Chicken", 93),
    ("Squid", 94),
    ("Wolf", 95),
    ("Mooshroom", 96),
    ("Snowman", 97),
    ("Ocelot", 98),
    ("IronGolem", 99),
    ("Villager", 120),
]);

pub const ENTITY_STATUS: EnumTable = EnumTable::new(&[
    ("damaged", 2),
    ("killed", 3),
    ("taming", 6),
    ("tamed", 7),
    ("drying", 8),
    ("eating", 9),
    ("sheep_eat", 10),
]);

pub const SOUND: EnumTable = EnumTable::new(&[
    ("click2", 1000),
    ("click1", 1001),
    ("bow_fire", 1002),
    ("door_toggle", 1003),
    ("extinguish", 1004),
    ("record_play", 1005),
    ("charge", 1007),
    ("fireball", 1008),
    ("zombie_wood", 1010),
    ("zombie_metal", 1011),
    ("zombie_break", 1012),
    ("wither", 1013),
    ("smoke", 2000),
    ("block_break", 2001),
    ("splash_potion", 2002),
    ("ender_eye", 2003),
    ("blaze", 2004),
]);

/// Game state changes.
pub const GAME_STATE: EnumTable = EnumTable::new(&[
    ("bad_bed", 0),
    ("start_rain", 1),
    ("stop_rain", 2),
    ("mode_change", 3),
    ("run_credits", 4),
]);

pub const WINDOW: EnumTable = EnumTable::new(&[
    ("chest", 0),
    ("workbench", 1),
    ("furnace", 2),
    ("dispenser", 3),
    ("enchatment_table", 4),
    ("brewing_stand", 5),
]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_both_directions() {
        assert_eq!(FACE.symbol(-1), Some("noop"));
        assert_eq!(FACE.value("+x"), Some(5));
        assert_eq!(DIMENSION.symbol(255), Some("nether"));
        assert_eq!(MOB.value("Villager"), Some(120));
    }

    #[test]
    fn test_unknown_entries() {
        assert_eq!(DIFFICULTY.symbol(4), None);
        assert_eq!(MODE.value("hardcore"), None);
    }

    #[test]
    fn test_tables_are_bijective() {
        let tables = [
            &FACE, &DIMENSION, &DIFFICULTY, &MODE, &EFFECT, &DIG_STATE,
            &ANIMATION, &ACTION, &VEHICLE, &MOB, &ENTITY_STATUS, &SOUND,
            &GAME_STATE, &WINDOW,
        ];
        for table in tables {
            for &(name, value) in table.entries() {
                assert_eq!(table.symbol(value), Some(name));
                assert_eq!(table.value(name), Some(value));
            }
        }
    }
}
