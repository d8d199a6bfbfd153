//! The fixed catalogs of spending and income categories.
//!
//! Every category belongs to exactly one group, e.g. "식비 - 외식" (dining out)
//! belongs to "식비" (food). Categories are stored and sent over the wire as
//! their label.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, transaction::TransactionKind};

/// Defines a category enum, its group enum and the label of every variant.
macro_rules! category_catalog {
    (
        $(#[$category_meta:meta])*
        $category:ident,
        $(#[$group_meta:meta])*
        $group:ident {
            $(
                $group_variant:ident => $group_label:literal {
                    $($variant:ident => $label:literal),+ $(,)?
                }
            ),+ $(,)?
        }
    ) => {
        $(#[$group_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $group {
            $(
                #[doc = $group_label]
                $group_variant
            ),+
        }

        impl $group {
            /// Every group in catalog order.
            pub const ALL: &'static [Self] = &[$(Self::$group_variant),+];

            /// The display label of the group.
            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$group_variant => $group_label),+
                }
            }
        }

        impl Display for $group {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.label())
            }
        }

        impl Serialize for $group {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }

        $(#[$category_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $category {
            $($(
                #[doc = $label]
                $variant
            ),+),+
        }

        impl $category {
            /// Every category in catalog order.
            pub const ALL: &'static [Self] = &[$($(Self::$variant),+),+];

            /// The label used for display, storage and the wire format.
            pub fn label(self) -> &'static str {
                match self {
                    $($(Self::$variant => $label),+),+
                }
            }

            /// The group the category belongs to.
            pub fn group(self) -> $group {
                match self {
                    $($(Self::$variant => $group::$group_variant),+),+
                }
            }
        }

        impl FromStr for $category {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let label = s.trim();

                Self::ALL
                    .iter()
                    .copied()
                    .find(|category| category.label() == label)
                    .ok_or_else(|| Error::InvalidCategory(label.to_owned()))
            }
        }

        impl Display for $category {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.label())
            }
        }

        impl Serialize for $category {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }

        impl<'de> Deserialize<'de> for $category {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let label = String::deserialize(deserializer)?;
                label.parse().map_err(serde::de::Error::custom)
            }
        }

        impl ToSql for $category {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.label()))
            }
        }

        impl FromSql for $category {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
            }
        }
    };
}

category_catalog! {
    /// A category of spending.
    SpendingCategory,
    /// The group a [SpendingCategory] belongs to.
    SpendingGroup {
        Food => "식비" {
            FoodGroceries => "식비 - 식료품",
            FoodDiningOut => "식비 - 외식",
            FoodCafeDrinks => "식비 - 카페/음료",
            FoodDelivery => "식비 - 배달음식",
            FoodSnacks => "식비 - 간식/디저트",
        },
        Transport => "교통비" {
            TransportPublic => "교통비 - 대중교통",
            TransportTaxi => "교통비 - 택시",
            TransportFuel => "교통비 - 주유비",
            TransportParking => "교통비 - 주차비",
            TransportTolls => "교통비 - 톨게이트",
        },
        Cafe => "카페" {
            CafeCoffee => "카페 - 커피",
            CafeTeaDrinks => "카페 - 차/음료",
            CafeDessert => "카페 - 디저트",
            CafeBrunch => "카페 - 브런치",
        },
        Household => "생활용품" {
            HouseholdDaily => "생활용품 - 일용품",
            HouseholdCleaning => "생활용품 - 청소용품",
            HouseholdCosmetics => "생활용품 - 화장품",
            HouseholdLaundry => "생활용품 - 세탁용품",
            HouseholdOther => "생활용품 - 기타",
        },
        Shopping => "쇼핑" {
            ShoppingOnline => "쇼핑 - 온라인쇼핑",
            ShoppingDepartmentStore => "쇼핑 - 백화점",
            ShoppingMart => "쇼핑 - 마트",
            ShoppingConvenienceStore => "쇼핑 - 편의점",
            ShoppingOther => "쇼핑 - 기타",
        },
        Finance => "금융" {
            FinanceInsurance => "금융 - 보험료",
            FinanceSavings => "금융 - 적금/투자",
            FinanceLoanInterest => "금융 - 대출이자",
            FinanceCardFee => "금융 - 카드연회비",
            FinanceBankFee => "금융 - 은행수수료",
            FinanceTax => "금융 - 세금",
        },
        Medical => "의료비" {
            MedicalHospital => "의료비 - 병원비",
            MedicalPharmacy => "의료비 - 약값",
            MedicalCheckup => "의료비 - 건강검진",
            MedicalDental => "의료비 - 치과",
        },
        Culture => "문화생활" {
            CultureMovies => "문화생활 - 영화",
            CulturePerformances => "문화생활 - 공연",
            CultureTravel => "문화생활 - 여행",
            CultureHobbies => "문화생활 - 취미",
        },
        Clothing => "의류" {
            ClothingClothes => "의류 - 옷",
            ClothingShoes => "의류 - 신발",
            ClothingBags => "의류 - 가방",
            ClothingAccessories => "의류 - 액세서리",
        },
        Housing => "주거비" {
            HousingRent => "주거비 - 월세/관리비",
            HousingElectricity => "주거비 - 전기요금",
            HousingGas => "주거비 - 가스요금",
            HousingWater => "주거비 - 수도요금",
            HousingInternet => "주거비 - 인터넷",
        },
        Education => "교육" {
            EducationAcademy => "교육 - 학원비",
            EducationBooks => "교육 - 도서",
            EducationOnline => "교육 - 온라인강의",
        },
    }
}

category_catalog! {
    /// A category of income.
    IncomeCategory,
    /// The group an [IncomeCategory] belongs to.
    IncomeGroup {
        Salary => "급여" {
            SalaryRegular => "급여 - 정규급여",
            SalaryBonus => "급여 - 보너스",
            SalaryIncentive => "급여 - 상여금",
            SalaryOvertime => "급여 - 야근수당",
            SalaryHoliday => "급여 - 휴가수당",
        },
        SideJob => "부업" {
            SideJobFreelance => "부업 - 프리랜서",
            SideJobPartTime => "부업 - 아르바이트",
            SideJobTeaching => "부업 - 온라인강의",
            SideJobConsulting => "부업 - 컨설팅",
            SideJobTranslation => "부업 - 번역",
        },
        Investment => "투자" {
            InvestmentDividends => "투자 - 주식배당",
            InvestmentFunds => "투자 - 펀드수익",
            InvestmentMaturedSavings => "투자 - 적금만기",
            InvestmentBondInterest => "투자 - 채권이자",
            InvestmentCrypto => "투자 - 암호화폐",
        },
        Business => "사업" {
            BusinessSales => "사업 - 매출",
            BusinessCommission => "사업 - 수수료",
            BusinessRoyalties => "사업 - 로열티",
            BusinessLicensing => "사업 - 라이센스",
        },
        Other => "기타수입" {
            OtherGift => "기타수입 - 선물",
            OtherRefund => "기타수입 - 환급금",
            OtherSecondHand => "기타수입 - 중고판매",
            OtherRebate => "기타수입 - 리베이트",
            OtherMisc => "기타수입 - 기타",
        },
    }
}

/// The category of a transaction of either kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// A category from the spending catalog.
    Spending(SpendingCategory),
    /// A category from the income catalog.
    Income(IncomeCategory),
}

impl Category {
    /// Parse `label` against the catalog for `kind`.
    ///
    /// # Errors
    /// Returns [Error::InvalidCategory] if `label` is not in the catalog for `kind`,
    /// including labels that only exist in the other catalog.
    pub fn parse(kind: TransactionKind, label: &str) -> Result<Self, Error> {
        match kind {
            TransactionKind::Spending => label.parse().map(Category::Spending),
            TransactionKind::Income => label.parse().map(Category::Income),
        }
    }

    /// The kind of transaction the category can be used for.
    pub fn kind(self) -> TransactionKind {
        match self {
            Category::Spending(_) => TransactionKind::Spending,
            Category::Income(_) => TransactionKind::Income,
        }
    }

    /// The label of the category.
    pub fn label(self) -> &'static str {
        match self {
            Category::Spending(category) => category.label(),
            Category::Income(category) => category.label(),
        }
    }

    /// The label of the group the category belongs to.
    pub fn group_label(self) -> &'static str {
        match self {
            Category::Spending(category) => category.group().label(),
            Category::Income(category) => category.group().label(),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.label()))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, transaction::TransactionKind};

    use super::{Category, IncomeCategory, IncomeGroup, SpendingCategory, SpendingGroup};

    #[test]
    fn catalog_sizes() {
        assert_eq!(SpendingCategory::ALL.len(), 50);
        assert_eq!(SpendingGroup::ALL.len(), 11);
        assert_eq!(IncomeCategory::ALL.len(), 23);
        assert_eq!(IncomeGroup::ALL.len(), 5);
    }

    #[test]
    fn parses_label_and_reports_group() {
        let category: SpendingCategory = "식비 - 외식".parse().unwrap();

        assert_eq!(category, SpendingCategory::FoodDiningOut);
        assert_eq!(category.group(), SpendingGroup::Food);
        assert_eq!(category.group().label(), "식비");
    }

    #[test]
    fn cafe_drinks_under_food_stay_in_food_group() {
        // "식비 - 카페/음료" and "카페 - 차/음료" look alike but belong to different groups.
        assert_eq!(
            SpendingCategory::FoodCafeDrinks.group(),
            SpendingGroup::Food
        );
        assert_eq!(SpendingCategory::CafeTeaDrinks.group(), SpendingGroup::Cafe);
    }

    #[test]
    fn every_label_starts_with_its_group_label() {
        for category in SpendingCategory::ALL {
            assert!(category.label().starts_with(category.group().label()));
        }

        for category in IncomeCategory::ALL {
            assert!(category.label().starts_with(category.group().label()));
        }
    }

    #[test]
    fn unknown_label_is_rejected() {
        let result: Result<SpendingCategory, _> = "식비".parse();

        assert_eq!(result, Err(Error::InvalidCategory("식비".to_owned())));
    }

    #[test]
    fn income_label_is_not_a_spending_category() {
        let result = Category::parse(TransactionKind::Spending, "급여 - 보너스");

        assert_eq!(
            result,
            Err(Error::InvalidCategory("급여 - 보너스".to_owned()))
        );
    }

    #[test]
    fn category_kind_matches_catalog() {
        let category = Category::parse(TransactionKind::Income, " 급여 - 보너스 ").unwrap();

        assert_eq!(category, Category::Income(IncomeCategory::SalaryBonus));
        assert_eq!(category.kind(), TransactionKind::Income);
        assert_eq!(category.group_label(), "급여");
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&SpendingCategory::HousingRent).unwrap();

        assert_eq!(json, "\"주거비 - 월세/관리비\"");
        assert_eq!(
            serde_json::from_str::<SpendingCategory>(&json).unwrap(),
            SpendingCategory::HousingRent
        );
    }
}
